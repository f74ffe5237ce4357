use async_trait::async_trait;
use ndarray::{Array2, Axis};
use reqwest::Client;
use serde_json::{json, Value};

use super::{ensure_non_blank, ensure_shape, Embedder};
use crate::core::errors::{PipelineError, PipelineResult};

const PROVIDER: &str = "huggingface";

/// Hugging Face Inference feature-extraction client.
///
/// Sentence-transformer models answer with one pooled vector per input.
/// Models that return token-level vectors are mean-pooled here.
pub struct HuggingFaceEmbedder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    dimensions: usize,
}

impl HuggingFaceEmbedder {
    pub fn new(
        client: Client,
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        dimensions: usize,
    ) -> PipelineResult<Self> {
        if model.trim().is_empty() {
            return Err(PipelineError::embedding(PROVIDER, "model must not be empty"));
        }
        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}/pipeline/feature-extraction",
                base_url.trim_end_matches('/'),
                model.trim_matches('/')
            ),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        ensure_non_blank(PROVIDER, texts)?;

        let body = json!({
            "inputs": texts,
            "options": { "wait_for_model": true },
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
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
                format!("inference API returned {}: {}", status, text),
            ));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| PipelineError::embedding(PROVIDER, e))?;
        let vectors = parse_feature_extraction(&payload)?;

        ensure_shape(PROVIDER, texts.len(), self.dimensions, &vectors)?;
        Ok(vectors)
    }
}

fn parse_feature_extraction(payload: &Value) -> PipelineResult<Vec<Vec<f32>>> {
    if let Some(message) = payload.get("error").and_then(|e| e.as_str()) {
        return Err(PipelineError::embedding(PROVIDER, message));
    }

    let Some(items) = payload.as_array() else {
        return Err(PipelineError::embedding(
            PROVIDER,
            "unexpected response shape: expected an array",
        ));
    };

    items.iter().map(parse_single).collect()
}

fn parse_single(item: &Value) -> PipelineResult<Vec<f32>> {
    let Some(values) = item.as_array() else {
        return Err(PipelineError::embedding(PROVIDER, "embedding is not an array"));
    };

    // [tokens][dims]: mean-pool across tokens.
    if values.first().map(Value::is_array).unwrap_or(false) {
        let rows = values
            .iter()
            .map(as_floats)
            .collect::<PipelineResult<Vec<_>>>()?;
        return mean_pool(rows);
    }

    as_floats(item)
}

fn as_floats(value: &Value) -> PipelineResult<Vec<f32>> {
    value
        .as_array()
        .ok_or_else(|| PipelineError::embedding(PROVIDER, "embedding is not an array"))?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| PipelineError::embedding(PROVIDER, "embedding contains a non-number"))
        })
        .collect()
}

fn mean_pool(rows: Vec<Vec<f32>>) -> PipelineResult<Vec<f32>> {
    let width = rows.first().map(Vec::len).unwrap_or(0);
    let height = rows.len();
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    let matrix = Array2::from_shape_vec((height, width), flat)
        .map_err(|e| PipelineError::embedding(PROVIDER, format!("ragged token embeddings: {}", e)))?;
    matrix
        .mean_axis(Axis(0))
        .map(|mean| mean.to_vec())
        .ok_or_else(|| PipelineError::embedding(PROVIDER, "empty token embeddings"))
}
