use crate::error::{PlateMateError, Result};
use crate::llm::gateway::{CompletionConfig, LlmGateway};
use crate::llm::models::LlmMessage;
use std::sync::Arc;
use tracing::{debug, info};

/// Binds a model name to a gateway and returns plain text answers
pub struct LlmBroker {
    model: String,
    gateway: Arc<dyn LlmGateway>,
}

impl LlmBroker {
    /// Create a new LLM broker
    pub fn new(model: impl Into<String>, gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            model: model.into(),
            gateway,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a trimmed text response. A response without content is an error.
    pub async fn generate(
        &self,
        messages: &[LlmMessage],
        config: Option<CompletionConfig>,
    ) -> Result<String> {
        let config = config.unwrap_or_default();

        info!(model = %self.model, "Requesting completion");
        let response = self.gateway.complete(&self.model, messages, &config).await?;
        debug!(finish_reason = ?response.finish_reason, "Completion received");

        response
            .content
            .map(|content| content.trim().to_string())
            .ok_or_else(|| PlateMateError::GatewayError("No content in response".to_string()))
    }
}
