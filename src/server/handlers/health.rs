use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub const LIVENESS_MESSAGE: &str = "Server is working!";

pub async fn liveness() -> &'static str {
    LIVENESS_MESSAGE
}

/// Readiness summary. An unreachable LLM is reported, not treated as down.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let llm = state.chain.llm();
    let llm_reachable = match llm.health_check().await {
        Ok(reachable) => reachable,
        Err(err) => {
            tracing::warn!(provider = llm.name(), "LLM health check failed: {}", err);
            false
        }
    };

    Json(json!({
        "status": "ok",
        "index": state.settings.vector_store.index_name,
        "llm_model": state.chain.model(),
        "llm_reachable": llm_reachable,
    }))
}
