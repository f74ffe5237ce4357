use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{ensure_non_blank, ensure_shape, Embedder};
use crate::core::errors::{PipelineError, PipelineResult};

const PROVIDER: &str = "openai_compatible";

/// `/embeddings` client for OpenAI-style servers (TEI, LM Studio, vLLM, ...).
pub struct OpenAiCompatibleEmbedder {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

impl OpenAiCompatibleEmbedder {
    pub fn new(
        client: Client,
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        dimensions: usize,
    ) -> PipelineResult<Self> {
        if base_url.trim().is_empty() {
            return Err(PipelineError::embedding(PROVIDER, "base_url must not be empty"));
        }
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiCompatibleEmbedder {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        ensure_non_blank(PROVIDER, texts)?;

        let url = format!("{}/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": texts,
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request
            .send()
            .await
            .map_err(|e| PipelineError::embedding(PROVIDER, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(PipelineError::embedding(
                PROVIDER,
                format!("embed error {}: {}", status, text),
            ));
        }

        let mut payload: EmbeddingsResponse = res
            .json()
            .await
            .map_err(|e| PipelineError::embedding(PROVIDER, e))?;

        // Servers may answer out of order; `index` restores input order.
        payload
            .data
            .sort_by_key(|item| item.index.unwrap_or(usize::MAX));
        let vectors: Vec<Vec<f32>> = payload.data.into_iter().map(|item| item.embedding).collect();

        ensure_shape(PROVIDER, texts.len(), self.dimensions, &vectors)?;
        Ok(vectors)
    }
}
