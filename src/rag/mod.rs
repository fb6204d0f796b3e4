//! Retrieval-augmented generation gateways.
//!
//! The recommendation service is an opaque remote endpoint that takes a
//! natural-language query and answers with free text.

pub mod gradio;

pub use gradio::{GradioConfig, GradioGateway};

use crate::error::Result;
use async_trait::async_trait;

/// Abstract interface for RAG providers
#[async_trait]
pub trait RagGateway: Send + Sync {
    async fn query(&self, query: &str) -> Result<String>;
}
