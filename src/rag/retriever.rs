//! Similarity search bound to a fixed `k` and score threshold.

use std::sync::Arc;

use crate::core::config::RetrievalSettings;
use crate::core::errors::{PipelineError, PipelineResult};
use crate::vector::{RetrievedPassage, VectorStoreClient};

pub struct Retriever {
    client: Arc<VectorStoreClient>,
    k: usize,
    score_threshold: f32,
}

impl Retriever {
    pub fn new(client: Arc<VectorStoreClient>, settings: &RetrievalSettings) -> Self {
        Self {
            client,
            k: settings.k,
            score_threshold: settings.score_threshold,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Embeds `query` and returns at most `k` passages at or above the
    /// threshold, best first. An empty result is not an error.
    pub async fn retrieve(&self, query: &str) -> PipelineResult<Vec<RetrievedPassage>> {
        if query.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "query must not be empty".to_string(),
            ));
        }

        let vector = self.client.embedder().embed(query).await?;
        let passages = self
            .client
            .search(&vector, self.k, self.score_threshold)
            .await?;

        tracing::debug!(
            k = self.k,
            score_threshold = self.score_threshold,
            retrieved = passages.len(),
            "Retrieved passages"
        );
        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{metadata_of, FakeEmbedder, StaticStore};
    use crate::vector::{InMemoryStore, ScoredEntry, TEXT_KEY};
    use serde_json::json;

    fn settings(k: usize, score_threshold: f32) -> RetrievalSettings {
        RetrievalSettings { k, score_threshold }
    }

    fn entry(id: &str, score: f32) -> ScoredEntry {
        let mut metadata = metadata_of(json!({"source": "polity.pdf"}));
        metadata.insert(TEXT_KEY.into(), json!(format!("text of {}", id)));
        ScoredEntry {
            id: id.to_string(),
            score,
            metadata,
        }
    }

    #[tokio::test]
    async fn keeps_at_most_k_above_threshold_in_descending_order() {
        let store = StaticStore::with_matches(vec![
            entry("low", 0.5),
            entry("mid", 0.75),
            entry("top", 0.92),
            entry("edge", 0.7),
            entry("high", 0.88),
        ]);
        let client = VectorStoreClient::new(
            Arc::new(FakeEmbedder::new(4)),
            Arc::new(store),
            10,
        );
        let retriever = Retriever::new(Arc::new(client), &settings(3, 0.7));

        let passages = retriever.retrieve("fundamental rights").await.unwrap();
        let ids: Vec<&str> = passages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["top", "high", "mid"]);
        assert!(passages.iter().all(|p| p.score >= 0.7));
        assert_eq!(passages[0].content, "text of top");
    }

    #[tokio::test]
    async fn nothing_relevant_is_an_empty_result() {
        let store = StaticStore::with_matches(vec![entry("a", 0.2), entry("b", 0.3)]);
        let client = VectorStoreClient::new(
            Arc::new(FakeEmbedder::new(4)),
            Arc::new(store),
            10,
        );
        let retriever = Retriever::new(Arc::new(client), &settings(4, 0.7));

        assert!(retriever.retrieve("weather").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_query_is_rejected_without_embedding() {
        let embedder = Arc::new(FakeEmbedder::new(4));
        let client = VectorStoreClient::new(
            embedder.clone(),
            Arc::new(InMemoryStore::new()),
            10,
        );
        let retriever = Retriever::new(Arc::new(client), &settings(4, 0.7));

        let err = retriever.retrieve("   ").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn finds_ingested_text_through_memory_store() {
        let embedder = Arc::new(FakeEmbedder::new(8));
        let client = Arc::new(VectorStoreClient::new(
            embedder,
            Arc::new(InMemoryStore::new()),
            10,
        ));
        client
            .upsert(
                &[
                    "Article 21 protects life and personal liberty.".to_string(),
                    "Article 32 guarantees constitutional remedies.".to_string(),
                ],
                &[
                    metadata_of(json!({"article": 21})),
                    metadata_of(json!({"article": 32})),
                ],
            )
            .await
            .unwrap();

        let retriever = Retriever::new(client, &settings(1, 0.9));
        let passages = retriever
            .retrieve("Article 32 guarantees constitutional remedies.")
            .await
            .unwrap();
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].metadata["article"], 32);
        assert!((passages[0].score - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let client = VectorStoreClient::new(
            Arc::new(FakeEmbedder::new(4)),
            Arc::new(StaticStore::unreachable("connection refused")),
            10,
        );
        let retriever = Retriever::new(Arc::new(client), &settings(4, 0.7));

        let err = retriever.retrieve("Article 14").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Vector store error (static): connection refused"
        );
    }
}
