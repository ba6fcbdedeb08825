//! Dummy LLM provider: echoes the user message back prefixed with `[echo]`.
//! Used for tests and offline runs without an API key.

use crate::llm::{CompletionRequest, ProviderError};

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
        Ok(format!("[echo] {}", request.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn complete_prefixes_echo() {
        let p = DummyProvider;
        let req = CompletionRequest::new("hello").with_system("ignored");
        assert_eq!(p.complete(&req).await.unwrap(), "[echo] hello");
    }

    #[tokio::test]
    async fn complete_empty_input() {
        let p = DummyProvider;
        assert_eq!(p.complete(&CompletionRequest::new("")).await.unwrap(), "[echo] ");
    }
}
