use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

/// Failures raised by the retrieval and generation components at request time.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Embedding error ({provider}): {message}")]
    Embedding { provider: String, message: String },

    #[error("Vector store error ({backend}): {message}")]
    VectorStore { backend: String, message: String },

    #[error("LLM error ({provider}): {message}")]
    Llm { provider: String, message: String },

    #[error("Prompt template error: {0}")]
    Template(String),

    #[error("{0}")]
    InvalidInput(String),
}

impl PipelineError {
    pub fn embedding(provider: &str, message: impl std::fmt::Display) -> Self {
        PipelineError::Embedding {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }

    pub fn vector_store(backend: &str, message: impl std::fmt::Display) -> Self {
        PipelineError::VectorStore {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }

    pub fn llm(provider: &str, message: impl std::fmt::Display) -> Self {
        PipelineError::Llm {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::internal(other),
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config at '{path}': {reason}")]
    Invalid { path: String, reason: String },

    #[error("Missing config value '{path}': {hint}")]
    Missing { path: String, hint: String },

    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

impl ConfigError {
    pub fn invalid(path: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
