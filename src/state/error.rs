use thiserror::Error;

use crate::core::errors::PipelineError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Failed to initialize embedder: {0}")]
    Embedder(#[source] PipelineError),

    #[error("Failed to connect to vector store: {0}")]
    VectorStore(#[source] PipelineError),

    #[error("Failed to load prompt template: {0}")]
    Prompt(#[source] PipelineError),
}
