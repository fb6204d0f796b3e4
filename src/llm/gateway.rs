use crate::error::Result;
use crate::llm::models::{LlmGatewayResponse, LlmMessage};
use async_trait::async_trait;

/// Configuration for LLM completion. Sampling is left to the provider's defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    pub max_tokens: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self { max_tokens: 1024 }
    }
}

/// Abstract interface for chat-completion providers
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Complete a chat request with a text response
    async fn complete(
        &self,
        model: &str,
        messages: &[LlmMessage],
        config: &CompletionConfig,
    ) -> Result<LlmGatewayResponse>;
}
