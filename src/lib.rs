//! PlateMate: classify a food photo, list its ingredients, and suggest a
//! healthier take on the dish.
//!
//! Every heavy computation is delegated to hosted services. This crate resolves
//! the image, calls the services in order through typed adapters, and decides
//! which failures end an interaction and which are only shown in place of a
//! stage's output.

pub mod adapters;
pub mod classifier;
pub mod config;
pub mod error;
pub mod image_source;
pub mod llm;
pub mod orchestrator;
pub mod rag;
pub mod web;

pub use error::{ImageSourceError, PlateMateError, Result, StageError};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::error::{PlateMateError, Result};
    pub use crate::image_source::{DecodedImage, ImageSource};
    pub use crate::orchestrator::{Interaction, Orchestrator, PipelineState};
    pub use crate::web::{create_router, AppState};
}
