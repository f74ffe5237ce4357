//! Shared fakes for unit tests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;

use crate::core::errors::{PipelineError, PipelineResult};
use crate::embeddings::Embedder;
use crate::llm::provider::LlmProvider;
use crate::llm::types::ChatRequest;
use crate::vector::{IndexEntry, Metadata, ScoredEntry, VectorStore};

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn metadata_of(value: Value) -> Metadata {
    value.as_object().cloned().unwrap_or_default()
}

/// Deterministic embedder: identical texts map to identical vectors.
pub struct FakeEmbedder {
    dimensions: usize,
    calls: AtomicUsize,
    fail_with: Option<String>,
}

impl FakeEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            calls: AtomicUsize::new(0),
            fail_with: None,
        }
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        (0..self.dimensions)
            .map(|i| {
                let mut hasher = DefaultHasher::new();
                (text, i).hash(&mut hasher);
                (hasher.finish() % 2_000) as f32 / 1_000.0 - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn name(&self) -> &str {
        "fake"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_with {
            return Err(PipelineError::embedding("fake", message));
        }
        crate::embeddings::ensure_non_blank("fake", texts)?;
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

/// Backend that returns canned matches, or fails every call.
pub struct StaticStore {
    matches: Vec<ScoredEntry>,
    fail_with: Option<String>,
}

impl StaticStore {
    pub fn with_matches(matches: Vec<ScoredEntry>) -> Self {
        Self {
            matches,
            fail_with: None,
        }
    }

    pub fn unreachable(message: &str) -> Self {
        Self {
            matches: Vec::new(),
            fail_with: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl VectorStore for StaticStore {
    fn name(&self) -> &str {
        "static"
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> PipelineResult<usize> {
        match &self.fail_with {
            Some(message) => Err(PipelineError::vector_store("static", message)),
            None => Ok(entries.len()),
        }
    }

    async fn query(&self, _vector: &[f32], top_k: usize) -> PipelineResult<Vec<ScoredEntry>> {
        if let Some(message) = &self.fail_with {
            return Err(PipelineError::vector_store("static", message));
        }
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }
}

/// LLM that records prompts and answers with a fixed reply.
pub struct FakeLlm {
    reply: Result<String, String>,
    prompts: Mutex<Vec<ChatRequest>>,
}

impl FakeLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for FakeLlm {
    fn name(&self) -> &str {
        "fake"
    }

    async fn health_check(&self) -> PipelineResult<bool> {
        Ok(self.reply.is_ok())
    }

    async fn chat(&self, request: ChatRequest, _model_id: &str) -> PipelineResult<String> {
        self.prompts.lock().unwrap().push(request);
        self.reply
            .clone()
            .map_err(|message| PipelineError::llm("fake", message))
    }
}
