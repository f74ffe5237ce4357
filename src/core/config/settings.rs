//! Typed view of the merged configuration.
//!
//! `ConfigService` produces a `serde_json::Value` from YAML files and the
//! environment; once it passes `validate_config` it is deserialized into
//! [`Settings`] and checked for cross-field requirements.

use serde::{Deserialize, Serialize};

use super::defaults::*;
use crate::core::errors::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
    pub prompt: PromptSettings,
    pub http: HttpSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    #[default]
    Huggingface,
    OpenaiCompatible,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProviderKind,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: DEFAULT_HF_INFERENCE_URL.to_string(),
            api_key: None,
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorStoreKind {
    #[default]
    Pinecone,
    Memory,
}

/// Similarity metric of the index, as Pinecone reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cosine,
    Dotproduct,
    Euclidean,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    pub provider: VectorStoreKind,
    pub api_key: Option<String>,
    pub index_name: String,
    /// Data-plane host. Resolved through the control plane when unset.
    pub index_host: Option<String>,
    pub namespace: Option<String>,
    /// Required together with `index_host` to skip the control plane.
    pub metric: Option<Metric>,
    pub controller_url: String,
    pub api_version: String,
    pub upsert_batch_size: usize,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: VectorStoreKind::default(),
            api_key: None,
            index_name: DEFAULT_INDEX_NAME.to_string(),
            index_host: None,
            namespace: None,
            metric: None,
            controller_url: DEFAULT_PINECONE_CONTROLLER_URL.to_string(),
            api_version: DEFAULT_PINECONE_API_VERSION.to_string(),
            upsert_batch_size: DEFAULT_UPSERT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub api_key: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: DEFAULT_LLM_TEMPERATURE,
            max_tokens: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub k: usize,
    pub score_threshold: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            k: DEFAULT_RETRIEVAL_K,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptPreset {
    #[default]
    Concise,
    LegalAdvisor,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    pub preset: PromptPreset,
    /// Overrides the preset when set.
    pub template: Option<String>,
}

impl PromptSettings {
    pub fn template_source(&self) -> &str {
        if let Some(template) = self.template.as_deref() {
            return template;
        }
        match self.preset {
            PromptPreset::Concise => CONCISE_TEMPLATE,
            PromptPreset::LegalAdvisor => LEGAL_ADVISOR_TEMPLATE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Cross-field checks that the per-field validator cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_index_access()?;
        require_secret(&self.llm.api_key, "llm.api_key", "GROQ_API_KEY")?;

        if let Some(template) = &self.prompt.template {
            if template.trim().is_empty() {
                return Err(ConfigError::invalid("prompt.template", "value cannot be empty"));
            }
        }

        Ok(())
    }

    /// The subset needed to embed and write to the index (no LLM).
    pub fn validate_index_access(&self) -> Result<(), ConfigError> {
        if self.vector_store.provider == VectorStoreKind::Pinecone {
            require_secret(&self.vector_store.api_key, "vector_store.api_key", "PINECONE_API_KEY")?;
            if self.vector_store.index_name.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "vector_store.index_name",
                    "value cannot be empty",
                ));
            }
        }

        if self.embedding.provider == EmbeddingProviderKind::OpenaiCompatible
            && self.embedding.base_url == DEFAULT_HF_INFERENCE_URL
        {
            return Err(ConfigError::invalid(
                "embedding.base_url",
                "openai_compatible embeddings need an explicit base_url",
            ));
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn require_secret(value: &Option<String>, path: &str, env_key: &str) -> Result<(), ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Ok(()),
        _ => Err(ConfigError::Missing {
            path: path.to_string(),
            hint: format!("set {} or add it to secrets.yaml", env_key),
        }),
    }
}
