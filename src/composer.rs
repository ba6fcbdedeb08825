//! Answer composer: turns graph context plus a question into generated text.
//!
//! Every call renders one user message from a [`PromptSet`] template, sends it
//! with the system instructions and the output-token cap, and waits at most
//! `timeout`. Nothing is retried; a timeout or provider failure is returned
//! to the caller as a [`ComposeError`].

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::llm::{CompletionRequest, LlmProvider, ProviderError};
use crate::prompt::{PromptBuilder, PromptSet};

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("upstream timed out after {0:?}")]
    UpstreamTimeout(Duration),
}

#[derive(Debug, Clone)]
pub struct AnswerComposer {
    provider: LlmProvider,
    prompts: PromptSet,
    max_output_tokens: u32,
    entity_max_output_tokens: u32,
    timeout: Duration,
}

impl AnswerComposer {
    pub fn new(
        provider: LlmProvider,
        prompts: PromptSet,
        max_output_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            prompts,
            max_output_tokens,
            entity_max_output_tokens: max_output_tokens,
            timeout,
        }
    }

    /// Output cap for [`generate_for_entity`](Self::generate_for_entity).
    /// Defaults to the general cap.
    pub fn with_entity_max_output_tokens(mut self, max_tokens: u32) -> Self {
        self.entity_max_output_tokens = max_tokens;
        self
    }

    /// Answer `question` from `context`.
    pub async fn generate(&self, context: &str, question: &str) -> Result<String, ComposeError> {
        let content = PromptBuilder::new("")
            .append(self.prompts.answer.as_str())
            .with_vars([("context", context), ("question", question)])
            .build();
        self.send(&content, &self.prompts.system, self.max_output_tokens).await
    }

    /// Describe what the graph relates to `entity`.
    pub async fn generate_for_entity(&self, context: &str, entity: &str) -> Result<String, ComposeError> {
        let content = PromptBuilder::new("")
            .append(self.prompts.entity_query.as_str())
            .with_vars([("context", context), ("entity", entity)])
            .build();
        self.send(&content, &self.prompts.entity_system, self.entity_max_output_tokens)
            .await
    }

    /// Answer a chat turn, with earlier turns rendered into `history`.
    pub async fn generate_turn(
        &self,
        context: &str,
        question: &str,
        history: &str,
    ) -> Result<String, ComposeError> {
        let history = if history.trim().is_empty() { "(none)" } else { history };
        let content = PromptBuilder::new("")
            .append(self.prompts.chat.as_str())
            .with_vars([("context", context), ("question", question), ("history", history)])
            .build();
        self.send(&content, &self.prompts.system, self.max_output_tokens).await
    }

    async fn send(&self, content: &str, system: &str, max_tokens: u32) -> Result<String, ComposeError> {
        let request = CompletionRequest::new(content)
            .with_system(system)
            .with_max_tokens(max_tokens);

        debug!(
            provider = self.provider.name(),
            content_len = content.len(),
            max_tokens,
            timeout_ms = self.timeout.as_millis() as u64,
            "composing answer"
        );

        match tokio::time::timeout(self.timeout, self.provider.complete(&request)).await {
            Err(_) => {
                warn!(timeout = ?self.timeout, "llm call exceeded timeout");
                Err(ComposeError::UpstreamTimeout(self.timeout))
            }
            Ok(Err(ProviderError::Timeout(msg))) => {
                warn!(error = %msg, "llm transport timed out");
                Err(ComposeError::UpstreamTimeout(self.timeout))
            }
            Ok(Err(e)) => Err(ComposeError::Upstream(e.to_string())),
            Ok(Ok(text)) => Ok(text),
        }
    }
}
