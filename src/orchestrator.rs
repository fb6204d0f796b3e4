//! The request pipeline.
//!
//! An [`Interaction`] is one visitor's state machine:
//!
//! ```text
//! Idle -> ImageSelected -> Classifying -> Classified
//!      -> FetchingIngredients -> FetchingRecommendation -> Done
//! ```
//!
//! with `Errored` reachable from `Classifying`. The [`Orchestrator`] owns the
//! adapters and drives an interaction through those states. A failed
//! classification (or an empty prediction list) ends the run. Once a label is
//! known, the ingredient and recommendation stages always both run; a failure in
//! either is rendered in place of its output and the run still reaches `Done`.

use crate::adapters::{ClassificationAdapter, IngredientAdapter, RecommendationAdapter};
use crate::classifier::{HuggingFaceClassifier, HuggingFaceConfig};
use crate::config::Settings;
use crate::error::{ImageSourceError, PlateMateError, Result, StageError};
use crate::image_source::{DecodedImage, ImageSource, ImageSourceResolver, PresetCatalog};
use crate::llm::gateways::{OpenAIConfig, OpenAIGateway};
use crate::llm::LlmBroker;
use crate::rag::{GradioConfig, GradioGateway};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const NO_PREDICTIONS: &str = "No predictions returned from the classification model.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    ImageSelected,
    Classifying,
    Classified,
    FetchingIngredients,
    FetchingRecommendation,
    Done,
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the visitor that is not part of a stage's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    ProviderError,
    Failed,
}

/// What a non-fatal stage shows: its output, or the error in its place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub status: StageStatus,
    pub text: String,
}

impl StageReport {
    fn completed(text: String) -> Self {
        Self {
            status: StageStatus::Completed,
            text,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == StageStatus::Completed
    }
}

/// Results of a classification run that found a label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionReport {
    pub label: String,
    pub confidence: f32,
    pub header: String,
    pub ingredients: StageReport,
    pub recommendation: StageReport,
}

pub fn food_header(label: &str, confidence: f32) -> String {
    format!("🍽️ Food: {} ({:.2}% confidence)", label, confidence * 100.0)
}

fn ingredients_report(outcome: std::result::Result<String, StageError>) -> StageReport {
    match outcome {
        Ok(text) => StageReport::completed(text),
        Err(e) => StageReport {
            status: match e {
                StageError::ProviderApi(_) => StageStatus::ProviderError,
                StageError::Generation(_) => StageStatus::Failed,
            },
            text: format!("Error generating ingredients: {}", e.message()),
        },
    }
}

fn recommendation_report(outcome: std::result::Result<String, StageError>) -> StageReport {
    match outcome {
        Ok(text) => StageReport::completed(text),
        Err(StageError::ProviderApi(msg)) => StageReport {
            status: StageStatus::ProviderError,
            text: format!("Provider API error: {}", msg),
        },
        Err(StageError::Generation(msg)) => StageReport {
            status: StageStatus::Failed,
            text: format!("Unable to generate healthier alternatives: {}", msg),
        },
    }
}

/// One visitor's pipeline state. Results live only until the next selection.
#[derive(Debug, Clone)]
pub struct Interaction {
    state: PipelineState,
    image: Option<DecodedImage>,
    report: Option<InteractionReport>,
    notices: Vec<Notice>,
    trail: Vec<PipelineState>,
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Idle,
            image: None,
            report: None,
            notices: vec![Notice::new(
                NoticeLevel::Info,
                ImageSourceError::NoImageProvided.to_string(),
            )],
            trail: vec![PipelineState::Idle],
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn image(&self) -> Option<&DecodedImage> {
        self.image.as_ref()
    }

    pub fn report(&self) -> Option<&InteractionReport> {
        self.report.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// States visited since the last image selection.
    pub fn trail(&self) -> &[PipelineState] {
        &self.trail
    }

    /// Classification needs an image and must not already be running.
    pub fn can_classify(&self) -> bool {
        self.image.is_some()
            && matches!(
                self.state,
                PipelineState::ImageSelected | PipelineState::Done | PipelineState::Errored
            )
    }

    fn transition(&mut self, to: PipelineState) {
        debug!(from = ?self.state, to = ?to, "Pipeline transition");
        self.state = to;
        self.trail.push(to);
    }

    fn reset(&mut self, to: PipelineState) {
        self.state = to;
        self.report = None;
        self.notices.clear();
        self.trail = vec![to];
    }
}

/// Drives interactions through the pipeline. Built once at startup.
pub struct Orchestrator {
    resolver: ImageSourceResolver,
    classification: ClassificationAdapter,
    ingredients: IngredientAdapter,
    recommendation: RecommendationAdapter,
}

impl Orchestrator {
    pub fn new(
        resolver: ImageSourceResolver,
        classification: ClassificationAdapter,
        ingredients: IngredientAdapter,
        recommendation: RecommendationAdapter,
    ) -> Self {
        Self {
            resolver,
            classification,
            ingredients,
            recommendation,
        }
    }

    /// Wire the hosted gateways from startup settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = settings.http_timeout;
        let credentials = &settings.credentials;

        let classifier = HuggingFaceClassifier::with_config(HuggingFaceConfig::from_settings(
            &credentials.inference_api_key,
            &settings.classifier,
            timeout,
        ))?;
        info!(endpoint = %classifier.endpoint(), "Classifier ready");

        let chat = OpenAIGateway::with_config(OpenAIConfig::from_settings(
            &credentials.inference_api_key,
            &settings.chat,
            timeout,
        ))?;
        info!(model = %settings.chat.model, "Chat gateway ready");

        let rag = GradioGateway::with_config(GradioConfig::from_settings(
            &credentials.provider_api_key,
            &settings.rag,
            timeout,
        ))?;
        info!(base_url = %settings.rag.base_url, "RAG gateway ready");

        Ok(Self::new(
            ImageSourceResolver::new(PresetCatalog::new(&settings.assets.assets_dir)),
            ClassificationAdapter::new(Arc::new(classifier)),
            IngredientAdapter::new(
                LlmBroker::new(settings.chat.model.clone(), Arc::new(chat)),
                settings.chat.ingredient_max_tokens,
            ),
            RecommendationAdapter::new(Arc::new(rag)),
        ))
    }

    pub fn catalog(&self) -> &PresetCatalog {
        self.resolver.catalog()
    }

    /// Resolve a selection. Success moves to `ImageSelected`; any resolver failure
    /// returns the interaction to `Idle` with a notice.
    pub fn select_image(&self, interaction: &mut Interaction, source: ImageSource) -> PipelineState {
        match self.resolver.resolve(source) {
            Ok(image) => {
                info!(origin = %image.origin, "Image selected");
                interaction.reset(PipelineState::Idle);
                interaction.image = Some(image);
                interaction.transition(PipelineState::ImageSelected);
            }
            Err(e) => {
                let level = match e {
                    ImageSourceError::NoImageProvided => NoticeLevel::Info,
                    ImageSourceError::MissingPreset { .. } | ImageSourceError::Undecodable(_) => {
                        NoticeLevel::Warning
                    }
                };
                info!(reason = %e, "No image selected");
                interaction.reset(PipelineState::Idle);
                interaction.image = None;
                interaction.notices.push(Notice::new(level, e.to_string()));
            }
        }
        interaction.state
    }

    /// Run the pipeline for the interaction's current image.
    ///
    /// Returns [`PlateMateError::InvalidState`] if there is no image to classify.
    /// Every other outcome, including a failed run, is reported through the
    /// interaction and the returned state.
    pub async fn classify(&self, interaction: &mut Interaction) -> Result<PipelineState> {
        if !interaction.can_classify() {
            return Err(PlateMateError::InvalidState(format!(
                "cannot classify from {:?} without a selected image",
                interaction.state
            )));
        }

        interaction.reset(PipelineState::ImageSelected);
        interaction.transition(PipelineState::Classifying);

        let Some(image) = interaction.image.as_ref() else {
            return Err(PlateMateError::InvalidState("no image selected".to_string()));
        };

        let result = match self.classification.classify(image).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Classification failed");
                interaction.notices.push(Notice::new(
                    NoticeLevel::Error,
                    format!("Error during classification: {}", e),
                ));
                interaction.transition(PipelineState::Errored);
                return Ok(interaction.state);
            }
        };

        let Some(top) = result.top() else {
            warn!("Classification returned no predictions");
            interaction.notices.push(Notice::new(NoticeLevel::Error, NO_PREDICTIONS));
            interaction.transition(PipelineState::Errored);
            return Ok(interaction.state);
        };

        let label = top.label.clone();
        let confidence = top.score;
        interaction.transition(PipelineState::Classified);

        interaction.transition(PipelineState::FetchingIngredients);
        let ingredients = ingredients_report(self.ingredients.lookup(&label).await);

        interaction.transition(PipelineState::FetchingRecommendation);
        let recommendation = recommendation_report(self.recommendation.recommend(&label).await);

        interaction.report = Some(InteractionReport {
            header: food_header(&label, confidence),
            label,
            confidence,
            ingredients,
            recommendation,
        });
        interaction.transition(PipelineState::Done);

        Ok(interaction.state)
    }
}
