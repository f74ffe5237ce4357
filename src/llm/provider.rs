use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::PipelineResult;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "groq")
    fn name(&self) -> &str;

    /// check if the provider is reachable with the configured key
    async fn health_check(&self) -> PipelineResult<bool>;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest, model_id: &str) -> PipelineResult<String>;
}
