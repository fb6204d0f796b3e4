use crate::error::StageError;
use crate::rag::RagGateway;
use std::sync::Arc;
use tracing::{info, warn};

/// Build the healthier-alternative query for a food label.
pub fn recommendation_query(label: &str) -> String {
    format!("What's a healthy {} recipe, and why is it healthy?", label)
}

/// Asks the RAG service for a healthier take on the dish.
#[derive(Clone)]
pub struct RecommendationAdapter {
    rag: Arc<dyn RagGateway>,
}

impl RecommendationAdapter {
    pub fn new(rag: Arc<dyn RagGateway>) -> Self {
        Self { rag }
    }

    /// Provider rejections come back as [`StageError::ProviderApi`], everything
    /// else as [`StageError::Generation`].
    pub async fn recommend(&self, label: &str) -> Result<String, StageError> {
        match self.rag.query(&recommendation_query(label)).await {
            Ok(text) => {
                info!(label = label, "Recommendation generated");
                Ok(text)
            }
            Err(e) => {
                warn!(label = label, error = %e, "Recommendation failed");
                Err(e.into())
            }
        }
    }
}
