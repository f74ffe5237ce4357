//! Pinecone data-plane client over its REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::math::{cosine_relevance, euclidean_relevance};
use super::{IndexEntry, Metadata, ScoredEntry, VectorStore};
use crate::core::config::{Metric, VectorStoreSettings};
use crate::core::errors::{PipelineError, PipelineResult};

const BACKEND: &str = "pinecone";
const MAX_TOP_K: usize = 10_000;

/// Raw Pinecone scores as relevance in `[0, 1]`, higher is more similar.
///
/// Euclidean scores are distances. Dot products of normalized embeddings
/// equal their cosine.
fn relevance(metric: Metric, raw: f32) -> f32 {
    match metric {
        Metric::Cosine | Metric::Dotproduct => cosine_relevance(raw),
        Metric::Euclidean => euclidean_relevance(raw),
    }
}

pub struct PineconeStore {
    client: Client,
    host: String,
    api_key: String,
    api_version: String,
    namespace: Option<String>,
    metric: Metric,
}

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    metric: Option<Metric>,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a Metadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: Option<usize>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    metadata: Option<Metadata>,
}

impl PineconeStore {
    /// Connects to the configured index.
    ///
    /// The control plane is asked for the host, metric and dimension unless
    /// both `index_host` and `metric` are configured. A dimension that
    /// disagrees with the embedder, or a configured metric that disagrees
    /// with the index, is rejected here rather than on the first query.
    pub async fn connect(
        client: Client,
        settings: &VectorStoreSettings,
        expected_dimensions: usize,
    ) -> PipelineResult<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PipelineError::vector_store(BACKEND, "API key is not configured"))?;

        let explicit_host = settings
            .index_host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .map(normalize_host);

        let mut store = Self {
            client,
            host: explicit_host.clone().unwrap_or_default(),
            api_key,
            api_version: settings.api_version.clone(),
            namespace: settings.namespace.clone().filter(|ns| !ns.is_empty()),
            metric: settings.metric.unwrap_or(Metric::Cosine),
        };

        if let (Some(_), Some(metric)) = (&explicit_host, settings.metric) {
            tracing::info!(host = %store.host, metric = ?metric, "Using configured Pinecone host");
            return Ok(store);
        }

        let description = store
            .describe_index(&settings.controller_url, &settings.index_name)
            .await?;
        if let Some(dimension) = description.dimension {
            if dimension != expected_dimensions {
                return Err(PipelineError::vector_store(
                    BACKEND,
                    format!(
                        "index '{}' has dimension {}, embedder produces {}",
                        settings.index_name, dimension, expected_dimensions
                    ),
                ));
            }
        }
        if let (Some(configured), Some(actual)) = (settings.metric, description.metric) {
            if configured != actual {
                return Err(PipelineError::vector_store(
                    BACKEND,
                    format!(
                        "index '{}' uses metric {:?}, configured {:?}",
                        settings.index_name, actual, configured
                    ),
                ));
            }
        }

        if explicit_host.is_none() {
            store.host = normalize_host(&description.host);
        }
        store.metric = description
            .metric
            .or(settings.metric)
            .unwrap_or(Metric::Cosine);

        tracing::info!(
            index = %settings.index_name,
            host = %store.host,
            metric = ?store.metric,
            "Connected to Pinecone index"
        );
        Ok(store)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    async fn describe_index(
        &self,
        controller_url: &str,
        index_name: &str,
    ) -> PipelineResult<IndexDescription> {
        let url = format!(
            "{}/indexes/{}",
            controller_url.trim_end_matches('/'),
            index_name
        );
        let res = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| PipelineError::vector_store(BACKEND, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(PipelineError::vector_store(
                BACKEND,
                format!("describe index '{}' failed ({}): {}", index_name, status, text),
            ));
        }

        res.json()
            .await
            .map_err(|e| PipelineError::vector_store(BACKEND, e))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> PipelineResult<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let vectors: Vec<UpsertVector<'_>> = entries
            .iter()
            .map(|e| UpsertVector {
                id: &e.id,
                values: &e.values,
                metadata: &e.metadata,
            })
            .collect();

        let mut body = json!({ "vectors": vectors });
        if let (Some(ns), Some(obj)) = (&self.namespace, body.as_object_mut()) {
            obj.insert("namespace".to_string(), json!(ns));
        }

        let url = format!("{}/vectors/upsert", self.host);
        let res = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::vector_store(BACKEND, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(PipelineError::vector_store(
                BACKEND,
                format!("upsert failed ({}): {}", status, text),
            ));
        }

        let payload: UpsertResponse = res
            .json()
            .await
            .map_err(|e| PipelineError::vector_store(BACKEND, e))?;
        Ok(payload.upserted_count.unwrap_or(entries.len()))
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> PipelineResult<Vec<ScoredEntry>> {
        let mut body = json!({
            "vector": vector,
            "topK": top_k.min(MAX_TOP_K),
            "includeMetadata": true,
            "includeValues": false,
        });
        if let (Some(ns), Some(obj)) = (&self.namespace, body.as_object_mut()) {
            obj.insert("namespace".to_string(), json!(ns));
        }

        let url = format!("{}/query", self.host);
        let res = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::vector_store(BACKEND, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(PipelineError::vector_store(
                BACKEND,
                format!("query failed ({}): {}", status, text),
            ));
        }

        let payload: QueryResponse = res
            .json()
            .await
            .map_err(|e| PipelineError::vector_store(BACKEND, e))?;

        let mut matches: Vec<ScoredEntry> = payload
            .matches
            .into_iter()
            .map(|m| ScoredEntry {
                id: m.id,
                score: m.score.map(|s| relevance(self.metric, s)).unwrap_or(f32::NAN),
                metadata: m.metadata.unwrap_or_default(),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(matches)
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_upstream;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorded {
        bodies: Arc<Mutex<Vec<Value>>>,
    }

    fn settings(controller_url: &str) -> VectorStoreSettings {
        VectorStoreSettings {
            api_key: Some("pc-key".into()),
            controller_url: controller_url.to_string(),
            namespace: Some("laxmikant".into()),
            ..VectorStoreSettings::default()
        }
    }

    fn fake_index(recorded: Recorded, host_slot: Arc<Mutex<String>>) -> Router {
        fake_index_with(
            recorded,
            host_slot,
            "cosine",
            json!([
                {"id": "a", "score": 0.2, "metadata": {"text": "Article 14", "article": 14}},
                {"id": "b", "score": 0.9, "metadata": {"text": "Article 21", "article": 21}}
            ]),
        )
    }

    fn fake_index_with(
        recorded: Recorded,
        host_slot: Arc<Mutex<String>>,
        metric: &'static str,
        matches: Value,
    ) -> Router {
        Router::new()
            .route(
                "/indexes/:name",
                get(move |Path(name): Path<String>, headers: HeaderMap| {
                    let host = host_slot.lock().unwrap().clone();
                    async move {
                        assert_eq!(name, "indian-polity");
                        assert_eq!(headers["api-key"], "pc-key");
                        Json(json!({
                            "name": name,
                            "dimension": 3,
                            "metric": metric,
                            "host": host,
                        }))
                    }
                }),
            )
            .route(
                "/vectors/upsert",
                post(
                    |State(recorded): State<Recorded>, Json(body): Json<Value>| async move {
                        let count = body["vectors"].as_array().map(Vec::len).unwrap_or(0);
                        recorded.bodies.lock().unwrap().push(body);
                        Json(json!({ "upsertedCount": count }))
                    },
                ),
            )
            .route(
                "/query",
                post(
                    move |State(recorded): State<Recorded>, Json(body): Json<Value>| {
                        let matches = matches.clone();
                        async move {
                            recorded.bodies.lock().unwrap().push(body);
                            Json(json!({ "matches": matches }))
                        }
                    },
                ),
            )
            .with_state(recorded)
    }

    #[tokio::test]
    async fn resolves_host_then_upserts_and_queries() {
        let recorded = Recorded::default();
        let host_slot = Arc::new(Mutex::new(String::new()));
        let base = spawn_upstream(fake_index(recorded.clone(), host_slot.clone())).await;
        *host_slot.lock().unwrap() = base.clone();

        let store = PineconeStore::connect(Client::new(), &settings(&base), 3)
            .await
            .unwrap();
        assert_eq!(store.host(), base);
        assert_eq!(store.metric(), Metric::Cosine);

        let mut metadata = Metadata::new();
        metadata.insert("text".into(), json!("Article 21"));
        let written = store
            .upsert(vec![IndexEntry {
                id: "id-1".into(),
                values: vec![0.1, 0.2, 0.3],
                metadata,
            }])
            .await
            .unwrap();
        assert_eq!(written, 1);

        let matches = store.query(&[0.1, 0.2, 0.3], 4).await.unwrap();
        assert_eq!(matches[0].id, "b");
        assert!((matches[0].score - 0.95).abs() < 1e-5);
        assert!((matches[1].score - 0.6).abs() < 1e-5);

        let bodies = recorded.bodies.lock().unwrap();
        assert_eq!(bodies[0]["namespace"], "laxmikant");
        assert_eq!(bodies[0]["vectors"][0]["id"], "id-1");
        assert_eq!(bodies[1]["topK"], 4);
        assert_eq!(bodies[1]["includeMetadata"], true);
    }

    #[tokio::test]
    async fn dimension_mismatch_fails_at_connect() {
        let host_slot = Arc::new(Mutex::new("unused".to_string()));
        let base = spawn_upstream(fake_index(Recorded::default(), host_slot)).await;

        let err = PineconeStore::connect(Client::new(), &settings(&base), 384)
            .await
            .err()
            .expect("dimension mismatch should fail");
        assert!(err.to_string().contains("dimension 3"));
    }

    #[tokio::test]
    async fn explicit_host_skips_control_plane() {
        let mut settings = settings("http://127.0.0.1:9");
        settings.index_host = Some("indian-polity-abc.svc.pinecone.io".into());
        settings.metric = Some(Metric::Cosine);
        let store = PineconeStore::connect(Client::new(), &settings, 384).await.unwrap();
        assert_eq!(store.host(), "https://indian-polity-abc.svc.pinecone.io");
    }

    #[tokio::test]
    async fn explicit_host_without_metric_asks_control_plane() {
        let host_slot = Arc::new(Mutex::new("unused".to_string()));
        let base = spawn_upstream(fake_index_with(
            Recorded::default(),
            host_slot,
            "euclidean",
            json!([]),
        ))
        .await;

        let mut settings = settings(&base);
        settings.index_host = Some("indian-polity-abc.svc.pinecone.io".into());
        let store = PineconeStore::connect(Client::new(), &settings, 3).await.unwrap();
        assert_eq!(store.host(), "https://indian-polity-abc.svc.pinecone.io");
        assert_eq!(store.metric(), Metric::Euclidean);
    }

    #[tokio::test]
    async fn configured_metric_must_match_index() {
        let host_slot = Arc::new(Mutex::new("unused".to_string()));
        let base = spawn_upstream(fake_index_with(
            Recorded::default(),
            host_slot,
            "euclidean",
            json!([]),
        ))
        .await;

        let mut settings = settings(&base);
        settings.metric = Some(Metric::Cosine);
        let err = PineconeStore::connect(Client::new(), &settings, 3)
            .await
            .err()
            .expect("metric mismatch should fail");
        assert!(err.to_string().contains("uses metric Euclidean"));
    }

    #[tokio::test]
    async fn euclidean_distances_rank_nearest_first() {
        let host_slot = Arc::new(Mutex::new(String::new()));
        let base = spawn_upstream(fake_index_with(
            Recorded::default(),
            host_slot.clone(),
            "euclidean",
            json!([
                {"id": "far", "score": 3.5, "metadata": {"text": "Seventh Schedule"}},
                {"id": "near", "score": 0.05, "metadata": {"text": "Article 21"}}
            ]),
        ))
        .await;
        *host_slot.lock().unwrap() = base.clone();

        let store = PineconeStore::connect(Client::new(), &settings(&base), 3)
            .await
            .unwrap();
        assert_eq!(store.metric(), Metric::Euclidean);

        let matches = store.query(&[0.1, 0.2, 0.3], 4).await.unwrap();
        assert_eq!(matches[0].id, "near");
        assert!(matches[0].score > 0.9);
        assert_eq!(matches[1].score, 0.0);

        let client = crate::vector::VectorStoreClient::new(
            Arc::new(crate::test_support::FakeEmbedder::new(3)),
            Arc::new(store),
            10,
        );
        let passages = client.search(&[0.1, 0.2, 0.3], 1, 0.7).await.unwrap();
        let ids: Vec<&str> = passages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["near"]);
    }

    #[tokio::test]
    async fn query_errors_surface_status_and_body() {
        let router = Router::new().route(
            "/query",
            post(|| async { (StatusCode::UNAUTHORIZED, "Invalid API Key") }),
        );
        let base = spawn_upstream(router).await;
        let mut settings = settings("http://127.0.0.1:9");
        settings.index_host = Some(base);
        settings.metric = Some(Metric::Cosine);
        let store = PineconeStore::connect(Client::new(), &settings, 3).await.unwrap();

        let err = store.query(&[0.0, 1.0, 0.0], 4).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Vector store error (pinecone): query failed (401 Unauthorized): Invalid API Key"
        );
    }

    #[test]
    fn missing_key_is_rejected() {
        let settings = VectorStoreSettings::default();
        let rt = tokio::runtime::Runtime::new().unwrap();
        let result = rt.block_on(PineconeStore::connect(Client::new(), &settings, 384));
        assert!(result.is_err());
    }
}
