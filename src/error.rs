//! Error types and result aliases for PlateMate.
//!
//! [`PlateMateError`] covers everything that can go wrong talking to the hosted
//! services or loading configuration. Resolver failures ([`ImageSourceError`]) and
//! non-fatal adapter failures ([`StageError`]) get their own types because the
//! orchestrator treats them differently from a failed classification.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlateMateError {
    #[error("Gateway error: {0}")]
    GatewayError(String),

    #[error("Provider API error: {0}")]
    ApiError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, PlateMateError>;

/// Why the image source resolver could not produce an image.
#[derive(Error, Debug)]
pub enum ImageSourceError {
    #[error("Please select or upload an image to get started.")]
    NoImageProvided,

    #[error("Sample image '{}' not found.", preset_location(.name, .path))]
    MissingPreset { name: String, path: Option<PathBuf> },

    #[error("Uploaded file is not a readable JPEG or PNG image: {0}")]
    Undecodable(String),
}

fn preset_location(name: &str, path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => name.to_string(),
    }
}

/// A failure inside a stage whose error must not stop the rest of the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// The provider answered with an error status (auth, quota, rate limit).
    #[error("{0}")]
    ProviderApi(String),

    /// Anything else: transport failure, malformed response, empty answer.
    #[error("{0}")]
    Generation(String),
}

impl StageError {
    pub fn message(&self) -> &str {
        match self {
            StageError::ProviderApi(m) | StageError::Generation(m) => m,
        }
    }
}

impl From<PlateMateError> for StageError {
    fn from(err: PlateMateError) -> Self {
        match err {
            PlateMateError::ApiError(msg) => StageError::ProviderApi(msg),
            other => StageError::Generation(other.to_string()),
        }
    }
}
