//! Vector index access.
//!
//! [`VectorStore`] is the raw backend seam (Pinecone or in-process).
//! [`VectorStoreClient`] pairs a backend with an [`Embedder`] and exposes
//! the two operations the service needs: upsert-by-text and thresholded
//! similarity search.

pub mod math;
mod memory;
mod pinecone;

pub use memory::InMemoryStore;
pub use pinecone::PineconeStore;

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::core::errors::{PipelineError, PipelineResult};
use crate::embeddings::Embedder;

/// Metadata key holding the chunk text inside each indexed entry.
pub const TEXT_KEY: &str = "text";

const UPSERT_CONCURRENCY: usize = 2;

pub type Metadata = Map<String, Value>;

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub id: String,
    /// Relevance in `[0, 1]`, higher is more similar.
    pub score: f32,
    pub metadata: Metadata,
}

/// A chunk returned by a search, with the text lifted out of its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedPassage {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    pub score: f32,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    fn name(&self) -> &str;

    /// Insert or overwrite entries. Returns how many were written.
    async fn upsert(&self, entries: Vec<IndexEntry>) -> PipelineResult<usize>;

    /// The `top_k` nearest entries, ordered by descending relevance.
    async fn query(&self, vector: &[f32], top_k: usize) -> PipelineResult<Vec<ScoredEntry>>;
}

pub struct VectorStoreClient {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    batch_size: usize,
}

impl VectorStoreClient {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, batch_size: usize) -> Self {
        Self {
            embedder,
            store,
            batch_size: batch_size.max(1),
        }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Embeds every chunk and stores it with its metadata.
    ///
    /// `chunks` and `metadata` are paired by position; a length mismatch is
    /// rejected before any embedding call is made.
    pub async fn upsert(&self, chunks: &[String], metadata: &[Metadata]) -> PipelineResult<usize> {
        if chunks.len() != metadata.len() {
            return Err(PipelineError::InvalidInput(format!(
                "chunks and metadata length mismatch: {} != {}",
                chunks.len(),
                metadata.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(0);
        }

        let total = stream::iter(
            chunks
                .chunks(self.batch_size)
                .zip(metadata.chunks(self.batch_size)),
        )
        .map(|(texts, metas)| self.upsert_batch(texts, metas))
        .buffered(UPSERT_CONCURRENCY)
        .try_fold(0usize, |acc, written| async move { Ok(acc + written) })
        .await?;

        tracing::info!(
            store = self.store.name(),
            chunks = chunks.len(),
            written = total,
            "Upserted chunks"
        );
        Ok(total)
    }

    async fn upsert_batch(&self, texts: &[String], metas: &[Metadata]) -> PipelineResult<usize> {
        let vectors = self.embedder.embed_batch(texts).await?;

        let entries = texts
            .iter()
            .zip(metas)
            .zip(vectors)
            .map(|((text, meta), values)| {
                let mut metadata = meta.clone();
                metadata.insert(TEXT_KEY.to_string(), Value::String(text.clone()));
                IndexEntry {
                    id: Uuid::new_v4().to_string(),
                    values,
                    metadata,
                }
            })
            .collect();

        self.store.upsert(entries).await
    }

    /// At most `k` passages scoring at least `score_threshold`, best first.
    ///
    /// No qualifying passage is an empty result, not an error.
    pub async fn search(
        &self,
        query_vector: &[f32],
        k: usize,
        score_threshold: f32,
    ) -> PipelineResult<Vec<RetrievedPassage>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let matches = self.store.query(query_vector, k).await?;
        let candidates = matches.len();
        let passages = select_passages(matches, k, score_threshold);

        tracing::debug!(
            store = self.store.name(),
            candidates,
            kept = passages.len(),
            score_threshold,
            "Vector search finished"
        );
        Ok(passages)
    }
}

/// Applies the threshold, order and bound regardless of what the backend returned.
fn select_passages(matches: Vec<ScoredEntry>, k: usize, score_threshold: f32) -> Vec<RetrievedPassage> {
    let mut passages: Vec<RetrievedPassage> = matches
        .into_iter()
        .filter(|m| m.score.is_finite() && m.score >= score_threshold)
        .filter_map(|m| {
            let mut metadata = m.metadata;
            let content = match metadata.remove(TEXT_KEY) {
                Some(Value::String(text)) => text,
                _ => {
                    tracing::warn!(id = %m.id, "Match has no text in metadata; skipping");
                    return None;
                }
            };
            Some(RetrievedPassage {
                id: m.id,
                content,
                metadata,
                score: m.score,
            })
        })
        .collect();

    passages.sort_by(|a, b| b.score.total_cmp(&a.score));
    passages.truncate(k);
    passages
}
