use crate::classifier::{ClassificationResult, ImageClassifier};
use crate::error::Result;
use crate::image_source::DecodedImage;
use std::sync::Arc;
use tracing::{debug, info};

/// Submits images to the classifier. No validation beyond what the provider does.
#[derive(Clone)]
pub struct ClassificationAdapter {
    classifier: Arc<dyn ImageClassifier>,
}

impl ClassificationAdapter {
    pub fn new(classifier: Arc<dyn ImageClassifier>) -> Self {
        Self { classifier }
    }

    /// An empty result is returned as `Ok`; callers must check before indexing.
    pub async fn classify(&self, image: &DecodedImage) -> Result<ClassificationResult> {
        let result = self.classifier.classify(image).await?;

        match result.top() {
            Some(top) => info!(label = %top.label, score = top.score, "Image classified"),
            None => info!("Classifier returned no predictions"),
        }
        debug!(predictions = result.len(), "Classification complete");

        Ok(result)
    }
}
