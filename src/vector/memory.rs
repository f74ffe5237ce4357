use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::math::{cosine_relevance, rank_descending_by_cosine};
use super::{IndexEntry, ScoredEntry, VectorStore};
use crate::core::errors::{PipelineError, PipelineResult};

const BACKEND: &str = "memory";

/// Process-local index scored by cosine similarity.
///
/// Scores use the same `[0, 1]` relevance mapping as a cosine Pinecone index,
/// so thresholds carry over between the two.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, IndexEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> PipelineResult<usize> {
        let mut store = self.entries.write().await;
        let dimension = store.values().next().map(|e| e.values.len());
        if let Some(dimension) = dimension {
            if let Some(bad) = entries.iter().find(|e| e.values.len() != dimension) {
                return Err(PipelineError::vector_store(
                    BACKEND,
                    format!(
                        "entry {} has dimension {}, index has {}",
                        bad.id,
                        bad.values.len(),
                        dimension
                    ),
                ));
            }
        }

        let written = entries.len();
        for entry in entries {
            store.insert(entry.id.clone(), entry);
        }
        Ok(written)
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> PipelineResult<Vec<ScoredEntry>> {
        let store = self.entries.read().await;
        let entries: Vec<&IndexEntry> = store.values().collect();

        let ranked = rank_descending_by_cosine(vector, entries.iter().map(|e| e.values.as_slice()))
            .map_err(|e| PipelineError::vector_store(BACKEND, e))?;

        Ok(ranked
            .into_iter()
            .take(top_k)
            .map(|(idx, similarity)| {
                let entry = entries[idx];
                ScoredEntry {
                    id: entry.id.clone(),
                    score: cosine_relevance(similarity),
                    metadata: entry.metadata.clone(),
                }
            })
            .collect())
    }
}
