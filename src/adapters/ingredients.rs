use crate::error::StageError;
use crate::llm::{CompletionConfig, LlmBroker, LlmMessage};
use tracing::{info, warn};

/// Build the ingredient prompt for a food label.
pub fn ingredient_prompt(label: &str) -> String {
    format!(
        "List only the main ingredients for {}. \
         Respond in a concise, comma-separated list without any extra text or explanations.",
        label
    )
}

/// Looks up a short ingredient list through a chat model. The model's formatting
/// is trusted as-is.
pub struct IngredientAdapter {
    broker: LlmBroker,
    max_tokens: usize,
}

impl IngredientAdapter {
    pub fn new(broker: LlmBroker, max_tokens: usize) -> Self {
        Self { broker, max_tokens }
    }

    pub async fn lookup(&self, label: &str) -> Result<String, StageError> {
        let messages = vec![LlmMessage::user(ingredient_prompt(label))];
        let config = CompletionConfig {
            max_tokens: self.max_tokens,
        };

        match self.broker.generate(&messages, Some(config)).await {
            Ok(ingredients) => {
                info!(label = label, "Ingredients generated");
                Ok(ingredients)
            }
            Err(e) => {
                warn!(label = label, error = %e, "Ingredient lookup failed");
                Err(e.into())
            }
        }
    }
}
