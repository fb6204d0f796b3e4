//! Startup configuration.
//!
//! Everything the service needs is read once, before the server starts, into a
//! [`Settings`] value that is then handed by reference to whoever needs it. The
//! two credentials are mandatory; every other value has a default.

use crate::error::{PlateMateError, Result};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const HF_API_KEY: &str = "HF_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

pub const DEFAULT_CLASSIFIER_URL: &str = "https://router.huggingface.co/hf-inference/models";
pub const DEFAULT_CLASSIFIER_MODEL: &str = "Shresthadev403/food-image-classification";
pub const DEFAULT_CHAT_URL: &str = "https://router.huggingface.co/v1";
pub const DEFAULT_CHAT_MODEL: &str = "Qwen/Qwen2.5-Coder-32B-Instruct";
pub const DEFAULT_INGREDIENT_MAX_TOKENS: usize = 50;
pub const DEFAULT_RAG_URL: &str = "http://127.0.0.1:7860";
pub const DEFAULT_RAG_API_NAME: &str = "get_response";
pub const DEFAULT_RAG_PATH_PREFIX: &str = "/gradio_api";
pub const DEFAULT_BANNER: &str = "IR_IMAGE.png";
pub const DEFAULT_BIND: &str = "0.0.0.0:8501";
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

/// API keys for the hosted services. Immutable once loaded.
#[derive(Clone)]
pub struct Credentials {
    /// Hosted inference key, used for both classification and chat completion.
    pub inference_api_key: String,
    /// Key for the second provider, forwarded to the RAG service.
    pub provider_api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("inference_api_key", &"<redacted>")
            .field("provider_api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub base_url: String,
    pub model: String,
    pub ingredient_max_tokens: usize,
}

/// Where the healthier-recipe service lives. The address is ephemeral
/// infrastructure, so nothing about it is assumed beyond the call protocol.
#[derive(Debug, Clone)]
pub struct RagSettings {
    pub base_url: String,
    pub api_name: String,
    pub path_prefix: String,
}

#[derive(Debug, Clone)]
pub struct AssetSettings {
    pub assets_dir: PathBuf,
    pub banner: PathBuf,
}

impl AssetSettings {
    /// Banner location resolved against the assets directory.
    pub fn banner_path(&self) -> PathBuf {
        self.assets_dir.join(&self.banner)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub classifier: ClassifierSettings,
    pub chat: ChatSettings,
    pub rag: RagSettings,
    pub assets: AssetSettings,
    pub bind: SocketAddr,
    pub http_timeout: Option<Duration>,
    /// How long a visitor's session (and its image) outlives its last request.
    pub session_idle: Duration,
}

impl Settings {
    /// Load settings from the process environment, after merging a `.env` file
    /// if one is present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| PlateMateError::ConfigError(format!("{} must be set", key)))
        };
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let credentials = Credentials {
            inference_api_key: required(HF_API_KEY)?,
            provider_api_key: required(OPENAI_API_KEY)?,
        };

        let ingredient_max_tokens = match get("PLATEMATE_INGREDIENT_MAX_TOKENS") {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                PlateMateError::ConfigError(format!(
                    "PLATEMATE_INGREDIENT_MAX_TOKENS must be a positive integer, got '{}'",
                    raw
                ))
            })?,
            None => DEFAULT_INGREDIENT_MAX_TOKENS,
        };

        let bind_raw = or_default("PLATEMATE_BIND", DEFAULT_BIND);
        let bind = bind_raw.parse::<SocketAddr>().map_err(|e| {
            PlateMateError::ConfigError(format!("PLATEMATE_BIND '{}' is invalid: {}", bind_raw, e))
        })?;

        let http_timeout = match get("PLATEMATE_HTTP_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.parse::<u64>().map_err(|_| {
                PlateMateError::ConfigError(format!(
                    "PLATEMATE_HTTP_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?)),
            None => None,
        };

        let session_idle = match get("PLATEMATE_SESSION_IDLE_SECS") {
            Some(raw) => Duration::from_secs(raw.parse::<u64>().map_err(|_| {
                PlateMateError::ConfigError(format!(
                    "PLATEMATE_SESSION_IDLE_SECS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?),
            None => Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
        };

        Ok(Self {
            credentials,
            classifier: ClassifierSettings {
                base_url: trim_slash(or_default("PLATEMATE_CLASSIFIER_URL", DEFAULT_CLASSIFIER_URL)),
                model: or_default("PLATEMATE_CLASSIFIER_MODEL", DEFAULT_CLASSIFIER_MODEL),
            },
            chat: ChatSettings {
                base_url: trim_slash(or_default("PLATEMATE_CHAT_URL", DEFAULT_CHAT_URL)),
                model: or_default("PLATEMATE_CHAT_MODEL", DEFAULT_CHAT_MODEL),
                ingredient_max_tokens,
            },
            rag: RagSettings {
                base_url: trim_slash(or_default("PLATEMATE_RAG_URL", DEFAULT_RAG_URL)),
                api_name: or_default("PLATEMATE_RAG_API_NAME", DEFAULT_RAG_API_NAME)
                    .trim_start_matches('/')
                    .to_string(),
                path_prefix: normalize_prefix(
                    lookup("PLATEMATE_RAG_PATH_PREFIX")
                        .unwrap_or_else(|| DEFAULT_RAG_PATH_PREFIX.to_string()),
                ),
            },
            assets: AssetSettings {
                assets_dir: PathBuf::from(or_default("PLATEMATE_ASSETS_DIR", ".")),
                banner: PathBuf::from(or_default("PLATEMATE_BANNER", DEFAULT_BANNER)),
            },
            bind,
            http_timeout,
            session_idle,
        })
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

// An explicitly empty prefix is allowed (older Gradio servers mount at the root).
fn normalize_prefix(prefix: String) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
