use std::sync::Arc;
use std::time::Duration;

use crate::core::config::{Settings, VectorStoreKind};
use crate::embeddings::build_embedder;
use crate::llm::{LlmProvider, OpenAiCompatibleProvider};
use crate::rag::{AnswerChain, PromptTemplate, Retriever};
use crate::vector::{InMemoryStore, PineconeStore, VectorStore, VectorStoreClient};

pub mod error;

use error::InitializationError;

const LLM_PROVIDER_NAME: &str = "groq";

/// Read-only state shared by every request.
///
/// The answer chain is assembled once at startup; handlers only borrow it.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub chain: Arc<AnswerChain>,
}

impl AppState {
    /// Builds every component from validated settings.
    ///
    /// Any failure here (unreachable index, dimension mismatch, bad template)
    /// stops startup instead of surfacing on the first request.
    pub async fn initialize(settings: Settings) -> Result<Arc<Self>, InitializationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http.timeout_secs))
            .build()
            .map_err(InitializationError::HttpClient)?;

        let embedder = build_embedder(&settings.embedding, client.clone())
            .map_err(InitializationError::Embedder)?;

        let store: Arc<dyn VectorStore> = match settings.vector_store.provider {
            VectorStoreKind::Pinecone => Arc::new(
                PineconeStore::connect(client.clone(), &settings.vector_store, embedder.dimensions())
                    .await
                    .map_err(InitializationError::VectorStore)?,
            ),
            VectorStoreKind::Memory => {
                tracing::warn!("Using the in-memory vector store; the index starts empty");
                Arc::new(InMemoryStore::new())
            }
        };

        let vector_client = Arc::new(VectorStoreClient::new(
            embedder,
            store,
            settings.vector_store.upsert_batch_size,
        ));
        let retriever = Retriever::new(vector_client, &settings.retrieval);

        let template = PromptTemplate::parse(settings.prompt.template_source())
            .map_err(InitializationError::Prompt)?;

        let llm: Arc<dyn LlmProvider> = Arc::new(OpenAiCompatibleProvider::new(
            LLM_PROVIDER_NAME,
            &settings.llm.base_url,
            settings.llm.api_key.clone(),
            client,
        ));

        let chain = AnswerChain::new(retriever, template, llm, settings.llm.clone());
        tracing::info!(
            index = %settings.vector_store.index_name,
            model = %settings.llm.model,
            k = settings.retrieval.k,
            score_threshold = settings.retrieval.score_threshold,
            "Answer chain ready"
        );

        Ok(Self::from_parts(settings, chain))
    }

    pub fn from_parts(settings: Settings, chain: AnswerChain) -> Arc<Self> {
        Arc::new(AppState {
            settings: Arc::new(settings),
            chain: Arc::new(chain),
        })
    }
}
