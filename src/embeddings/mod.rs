//! Text embedding providers.
//!
//! An [`Embedder`] turns text into fixed-dimension vectors. The service only
//! talks to hosted models; both providers here are thin `reqwest` clients.

mod huggingface;
mod openai_compatible;

pub use huggingface::HuggingFaceEmbedder;
pub use openai_compatible::OpenAiCompatibleEmbedder;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::config::{EmbeddingProviderKind, EmbeddingSettings};
use crate::core::errors::{PipelineError, PipelineResult};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Provider name used in logs and error messages.
    fn name(&self) -> &str;

    /// Length of every vector this embedder returns.
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> PipelineResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| PipelineError::embedding(self.name(), "provider returned no vectors"))
    }
}

pub fn build_embedder(
    settings: &EmbeddingSettings,
    client: reqwest::Client,
) -> PipelineResult<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match settings.provider {
        EmbeddingProviderKind::Huggingface => Arc::new(HuggingFaceEmbedder::new(
            client,
            &settings.base_url,
            &settings.model,
            settings.api_key.clone(),
            settings.dimensions,
        )?),
        EmbeddingProviderKind::OpenaiCompatible => Arc::new(OpenAiCompatibleEmbedder::new(
            client,
            &settings.base_url,
            &settings.model,
            settings.api_key.clone(),
            settings.dimensions,
        )?),
    };
    Ok(embedder)
}

pub(crate) fn ensure_non_blank(provider: &str, texts: &[String]) -> PipelineResult<()> {
    if texts.is_empty() {
        return Err(PipelineError::embedding(provider, "no input texts"));
    }
    if let Some(index) = texts.iter().position(|t| t.trim().is_empty()) {
        return Err(PipelineError::embedding(
            provider,
            format!("input {} is empty", index),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_shape(
    provider: &str,
    expected_count: usize,
    dimensions: usize,
    vectors: &[Vec<f32>],
) -> PipelineResult<()> {
    if vectors.len() != expected_count {
        return Err(PipelineError::embedding(
            provider,
            format!(
                "expected {} vectors, provider returned {}",
                expected_count,
                vectors.len()
            ),
        ));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
        return Err(PipelineError::embedding(
            provider,
            format!(
                "dimension mismatch: expected {}, got {}",
                dimensions,
                bad.len()
            ),
        ));
    }
    Ok(())
}
