//! Answer chain: retrieve, fill the prompt, ask the LLM once.

use std::sync::Arc;

use serde::Serialize;

use super::prompt::PromptTemplate;
use super::retriever::Retriever;
use crate::core::config::LlmSettings;
use crate::core::errors::PipelineResult;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::vector::RetrievedPassage;

const CONTEXT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    /// Exactly the passages that were placed in the prompt, in order.
    pub sources: Vec<RetrievedPassage>,
}

pub struct AnswerChain {
    retriever: Retriever,
    template: PromptTemplate,
    llm: Arc<dyn LlmProvider>,
    llm_settings: LlmSettings,
}

impl AnswerChain {
    pub fn new(
        retriever: Retriever,
        template: PromptTemplate,
        llm: Arc<dyn LlmProvider>,
        llm_settings: LlmSettings,
    ) -> Self {
        Self {
            retriever,
            template,
            llm,
            llm_settings,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    pub fn model(&self) -> &str {
        &self.llm_settings.model
    }

    pub async fn answer(&self, question: &str) -> PipelineResult<Answer> {
        let sources = self.retriever.retrieve(question).await?;
        if sources.is_empty() {
            tracing::info!("No passages above threshold; answering with empty context");
        }

        let context = sources
            .iter()
            .map(|passage| passage.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);
        let prompt = self.template.render(&context, question);

        let request =
            ChatRequest::new(vec![ChatMessage::user(prompt)]).with_settings(&self.llm_settings);
        let text = self.llm.chat(request, &self.llm_settings.model).await?;

        tracing::info!(
            provider = self.llm.name(),
            model = %self.llm_settings.model,
            sources = sources.len(),
            "Answered question"
        );
        Ok(Answer { text, sources })
    }
}
