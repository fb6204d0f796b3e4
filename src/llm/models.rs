use serde::Serialize;

/// Who authored a chat turn. Serialized the way chat-completion APIs expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
}

/// One chat turn sent to a completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmMessage {
    pub role: MessageRole,
    pub content: String,
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// The first choice of a completion, as returned by a gateway.
#[derive(Debug, Clone, Default)]
pub struct LlmGatewayResponse {
    pub content: Option<String>,
    pub finish_reason: Option<String>,
}
