//! Image classification gateways.
//!
//! A classifier takes a decoded image and returns labelled predictions. The
//! hosted implementation lives in [`huggingface`]; anything implementing
//! [`ImageClassifier`] can stand in for it.

pub mod huggingface;

pub use huggingface::{HuggingFaceClassifier, HuggingFaceConfig};

use crate::error::Result;
use crate::image_source::DecodedImage;
use async_trait::async_trait;
use serde::Deserialize;

/// One label with its confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Predictions ordered by descending confidence. May be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationResult {
    predictions: Vec<Prediction>,
}

impl ClassificationResult {
    /// Sorts the predictions, highest confidence first.
    pub fn new(mut predictions: Vec<Prediction>) -> Self {
        predictions.sort_by(|a, b| b.score.total_cmp(&a.score));
        Self { predictions }
    }

    pub fn top(&self) -> Option<&Prediction> {
        self.predictions.first()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }
}

/// Abstract interface for image classification providers
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    async fn classify(&self, image: &DecodedImage) -> Result<ClassificationResult>;
}
