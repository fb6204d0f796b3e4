//! Gateway for a RAG app served by Gradio.
//!
//! Gradio exposes named endpoints through a two-step call protocol: a POST that
//! queues the job and returns an `event_id`, then a GET on the same path plus the
//! id that streams server-sent events until a `complete` or `error` event.

use crate::config::RagSettings;
use crate::error::{PlateMateError, Result};
use crate::rag::RagGateway;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct GradioConfig {
    pub base_url: String,
    /// Path prefix before `/call`, `""` or e.g. `/gradio_api`.
    pub path_prefix: String,
    pub api_name: String,
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
    pub timeout: Option<std::time::Duration>,
}

impl std::fmt::Debug for GradioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradioConfig")
            .field("base_url", &self.base_url)
            .field("path_prefix", &self.path_prefix)
            .field("api_name", &self.api_name)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GradioConfig {
    pub fn from_settings(
        api_key: impl Into<String>,
        rag: &RagSettings,
        timeout: Option<std::time::Duration>,
    ) -> Self {
        let api_key = api_key.into();
        Self {
            base_url: rag.base_url.clone(),
            path_prefix: rag.path_prefix.clone(),
            api_name: rag.api_name.clone(),
            api_key: (!api_key.is_empty()).then_some(api_key),
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueuedCall {
    event_id: String,
}

pub struct GradioGateway {
    client: Client,
    config: GradioConfig,
}

impl GradioGateway {
    pub fn with_config(config: GradioConfig) -> Result<Self> {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder.build()?;

        Ok(Self { client, config })
    }

    fn call_url(&self) -> String {
        format!(
            "{}{}/call/{}",
            self.config.base_url, self.config.path_prefix, self.config.api_name
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    async fn submit(&self, query: &str) -> Result<String> {
        let body = serde_json::json!({ "data": [query] });

        let response = self
            .authorize(self.client.post(self.call_url()))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PlateMateError::ApiError(format!("{} - {}", status, error_text)));
        }

        let queued: QueuedCall = response.json().await?;
        Ok(queued.event_id)
    }

    async fn fetch_result(&self, event_id: &str) -> Result<String> {
        let response = self
            .authorize(self.client.get(format!("{}/{}", self.call_url(), event_id)))
            .header("Accept", "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PlateMateError::ApiError(format!("{} - {}", status, error_text)));
        }

        let stream = response.text().await?;
        parse_event_stream(&stream)
    }
}

#[async_trait]
impl RagGateway for GradioGateway {
    async fn query(&self, query: &str) -> Result<String> {
        info!(api_name = %self.config.api_name, "Querying RAG service");

        let event_id = self.submit(query).await?;
        debug!(event_id = %event_id, "RAG call queued");

        self.fetch_result(&event_id).await
    }
}

/// Pull the answer out of a Gradio event stream.
fn parse_event_stream(stream: &str) -> Result<String> {
    let mut event = String::new();

    for line in stream.lines() {
        let line = line.trim_end();

        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim().to_string();
            continue;
        }

        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();

        match event.as_str() {
            "complete" => {
                let value: Value = serde_json::from_str(data)?;
                return render_output(&value);
            }
            "error" => {
                let detail = match serde_json::from_str::<Value>(data) {
                    Ok(Value::String(message)) => message,
                    Ok(Value::Null) | Err(_) if data.is_empty() || data == "null" => {
                        "RAG service reported an error".to_string()
                    }
                    _ => data.to_string(),
                };
                return Err(PlateMateError::GatewayError(detail));
            }
            other => {
                debug!(event = other, "Skipping intermediate event");
            }
        }
    }

    warn!("Event stream ended without a result");
    Err(PlateMateError::GatewayError(
        "RAG service closed the stream without a result".to_string(),
    ))
}

/// Strings are returned verbatim; anything else is rendered as JSON.
fn render_output(value: &Value) -> Result<String> {
    let first = match value {
        Value::Array(items) => items.first().ok_or_else(|| {
            PlateMateError::GatewayError("RAG service returned no outputs".to_string())
        })?,
        other => other,
    };

    Ok(match first {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    })
}
