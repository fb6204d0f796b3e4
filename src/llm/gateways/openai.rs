//! OpenAI-compatible chat completion gateway.
//!
//! Any provider that speaks the `/chat/completions` wire format works here; the
//! default configuration points at the hosted inference router.

use crate::config::ChatSettings;
use crate::error::{PlateMateError, Result};
use crate::llm::gateway::{CompletionConfig, LlmGateway};
use crate::llm::models::{LlmGatewayResponse, LlmMessage};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

/// Configuration for connecting to an OpenAI-compatible API.
#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Option<std::time::Duration>,
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenAIConfig {
    pub fn from_settings(
        api_key: impl Into<String>,
        chat: &ChatSettings,
        timeout: Option<std::time::Duration>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: chat.base_url.clone(),
            timeout,
        }
    }
}

/// Gateway for chat completions.
pub struct OpenAIGateway {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIGateway {
    /// Create a new gateway with custom configuration.
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder.build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl LlmGateway for OpenAIGateway {
    async fn complete(
        &self,
        model: &str,
        messages: &[LlmMessage],
        config: &CompletionConfig,
    ) -> Result<LlmGatewayResponse> {
        info!("Delegating to chat provider for completion");
        debug!("Model: {}, Message count: {}", model, messages.len());

        let body = serde_json::json!({
            "model": model,
            "messages": messages,
            "max_tokens": config.max_tokens,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PlateMateError::ApiError(format!("{} - {}", status, error_text)));
        }

        let response_body: Value = response.json().await?;

        let choice = response_body["choices"]
            .as_array()
            .and_then(|choices| choices.first())
            .ok_or_else(|| PlateMateError::GatewayError("No choices in response".to_string()))?;

        Ok(LlmGatewayResponse {
            content: choice["message"]["content"].as_str().map(String::from),
            finish_reason: choice["finish_reason"].as_str().map(String::from),
        })
    }
}
