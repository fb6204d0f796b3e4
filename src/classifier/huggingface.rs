//! Hosted inference classifier.
//!
//! Sends the encoded image as the raw request body and reads back a JSON array of
//! `{label, score}` objects.

use crate::classifier::{ClassificationResult, ImageClassifier, Prediction};
use crate::config::ClassifierSettings;
use crate::error::{PlateMateError, Result};
use crate::image_source::DecodedImage;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

#[derive(Clone)]
pub struct HuggingFaceConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Option<std::time::Duration>,
}

impl std::fmt::Debug for HuggingFaceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HuggingFaceConfig {
    pub fn from_settings(
        api_key: impl Into<String>,
        classifier: &ClassifierSettings,
        timeout: Option<std::time::Duration>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: classifier.base_url.clone(),
            model: classifier.model.clone(),
            timeout,
        }
    }
}

/// The model handle: an HTTP client bound to one model endpoint. Built once at
/// startup and shared.
pub struct HuggingFaceClassifier {
    client: Client,
    endpoint: String,
    config: HuggingFaceConfig,
}

impl HuggingFaceClassifier {
    pub fn with_config(config: HuggingFaceConfig) -> Result<Self> {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder.build()?;
        let endpoint = format!("{}/{}", config.base_url, config.model);

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageClassifier for HuggingFaceClassifier {
    async fn classify(&self, image: &DecodedImage) -> Result<ClassificationResult> {
        info!(model = %self.config.model, "Classifying image");
        debug!(
            origin = %image.origin,
            width = image.width(),
            height = image.height(),
            bytes = image.encoded.len(),
            "Submitting image to classifier"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", image.mime_type())
            .body(image.encoded.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PlateMateError::ApiError(format!("{} - {}", status, error_text)));
        }

        let predictions: Vec<Prediction> = response.json().await?;
        debug!(count = predictions.len(), "Classifier returned predictions");

        Ok(ClassificationResult::new(predictions))
    }
}
