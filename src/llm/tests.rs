use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::Client;
use serde_json::{json, Value};

use super::openai_compatible::OpenAiCompatibleProvider;
use super::provider::LlmProvider;
use super::types::{ChatMessage, ChatRequest};
use crate::core::config::LlmSettings;
use crate::test_support::spawn_upstream;

fn provider(base: &str) -> OpenAiCompatibleProvider {
    OpenAiCompatibleProvider::new("groq", &format!("{}/openai/v1", base), Some("gsk-test".into()), Client::new())
}

#[tokio::test]
async fn chat_sends_model_temperature_and_bearer_key() {
    let router = Router::new().route(
        "/openai/v1/chat/completions",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            assert_eq!(headers["authorization"], "Bearer gsk-test");
            assert_eq!(body["model"], "llama-3.1-8b-instant");
            assert_eq!(body["temperature"], 0.1);
            assert_eq!(body["stream"], false);
            assert_eq!(body["messages"][0]["role"], "user");
            assert!(body.get("max_tokens").is_none());
            Json(json!({
                "choices": [{"message": {"role": "assistant", "content": " Article 21 protects life. "}}]
            }))
        }),
    );
    let base = spawn_upstream(router).await;

    let request = ChatRequest::new(vec![ChatMessage::user("What is Article 21?")])
        .with_settings(&LlmSettings::default());
    let reply = provider(&base)
        .chat(request, "llama-3.1-8b-instant")
        .await
        .unwrap();

    assert_eq!(reply, "Article 21 protects life.");
}

#[tokio::test]
async fn empty_completion_is_an_error() {
    let router = Router::new().route(
        "/openai/v1/chat/completions",
        post(|| async { Json(json!({"choices": [{"message": {"content": ""}}]})) }),
    );
    let base = spawn_upstream(router).await;

    let err = provider(&base)
        .chat(ChatRequest::new(vec![ChatMessage::user("hi")]), "m")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "LLM error (groq): response contained no content");
}

#[tokio::test]
async fn upstream_error_body_is_kept() {
    let router = Router::new().route(
        "/openai/v1/chat/completions",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limit reached") }),
    );
    let base = spawn_upstream(router).await;

    let err = provider(&base)
        .chat(ChatRequest::new(vec![ChatMessage::user("hi")]), "m")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("429"));
    assert!(err.to_string().contains("rate limit reached"));
}

#[tokio::test]
async fn health_check_reflects_models_endpoint() {
    let router = Router::new().route("/openai/v1/models", get(|| async { Json(json!({"data": []})) }));
    let base = spawn_upstream(router).await;
    assert!(provider(&base).health_check().await.unwrap());

    let unreachable = OpenAiCompatibleProvider::new("groq", "http://127.0.0.1:9", None, Client::new());
    assert!(!unreachable.health_check().await.unwrap());
}

#[tokio::test]
#[ignore]
async fn test_live_groq_connection() {
    let Ok(key) = std::env::var("GROQ_API_KEY") else {
        return;
    };
    let provider = OpenAiCompatibleProvider::new(
        "groq",
        "https://api.groq.com/openai/v1",
        Some(key),
        Client::new(),
    );

    let request = ChatRequest {
        messages: vec![ChatMessage::user("Name one fundamental right in the Indian Constitution.")],
        temperature: Some(0.1),
        max_tokens: Some(32),
    };
    match provider.chat(request, "llama-3.1-8b-instant").await {
        Ok(response) => println!("Groq Chat Response: {}", response),
        Err(e) => panic!("Groq chat failed: {}", e),
    }
}
