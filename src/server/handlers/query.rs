use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::core::errors::{ApiError, PipelineError};
use crate::state::AppState;
use crate::vector::{Metadata, RetrievedPassage};

pub const MISSING_QUESTION: &str = "Missing 'question' in request";

const PREVIEW_CHARS: usize = 300;
const ELLIPSIS: &str = "...";

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceView>,
}

#[derive(Debug, Serialize)]
pub struct SourceView {
    pub content: String,
    pub metadata: Metadata,
    pub score: Value,
}

impl From<&RetrievedPassage> for SourceView {
    fn from(passage: &RetrievedPassage) -> Self {
        SourceView {
            content: preview(&passage.content),
            metadata: passage.metadata.clone(),
            score: score_value(passage.score),
        }
    }
}

/// The body is read raw so that absent, non-JSON and non-object payloads
/// all produce the same 400 instead of axum's extractor rejections.
/// A blank question is passed on; the retriever rejects it as invalid input.
pub async fn query(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let question = extract_question(&body)?;

    let answer = state.chain.answer(&question).await.map_err(|err| {
        match &err {
            PipelineError::InvalidInput(_) => tracing::debug!("Rejected query: {}", err),
            _ => tracing::error!("Query failed: {}", err),
        }
        ApiError::from(err)
    })?;

    Ok(Json(QueryResponse {
        answer: answer.text,
        sources: answer.sources.iter().map(SourceView::from).collect(),
    }))
}

fn extract_question(body: &[u8]) -> Result<String, ApiError> {
    let missing = || ApiError::BadRequest(MISSING_QUESTION.to_string());

    let payload: Value = serde_json::from_slice(body).map_err(|_| missing())?;
    let question = match payload.get("question") {
        None | Some(Value::Null) => return Err(missing()),
        Some(Value::String(text)) => text,
        Some(_) => {
            return Err(ApiError::BadRequest(
                "'question' must be a string".to_string(),
            ))
        }
    };
    Ok(question.clone())
}

fn preview(content: &str) -> String {
    let mut text: String = content.chars().take(PREVIEW_CHARS).collect();
    text.push_str(ELLIPSIS);
    text
}

fn score_value(score: f32) -> Value {
    serde_json::Number::from_f64(f64::from(score))
        .filter(|_| score.is_finite())
        .map(Value::Number)
        .unwrap_or_else(|| Value::String("N/A".to_string()))
}
