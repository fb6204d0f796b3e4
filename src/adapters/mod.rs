//! Adapters between the orchestrator and the hosted services.
//!
//! Classification errors propagate as [`crate::error::PlateMateError`] because a
//! failed classification ends the interaction. The ingredient and recommendation
//! adapters never propagate: they hand back a [`crate::error::StageError`] and
//! leave the fatal-or-not decision to the orchestrator.

pub mod classification;
pub mod ingredients;
pub mod recommendation;

pub use classification::ClassificationAdapter;
pub use ingredients::{ingredient_prompt, IngredientAdapter};
pub use recommendation::{recommendation_query, RecommendationAdapter};
