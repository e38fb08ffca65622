//! The text-generation capability consumed by the workflow.
//!
//! The engine only ever needs `generate(prompt) -> text`. Keeping that behind
//! a trait lets the classifier and action handlers take the capability as an
//! injected `Arc<dyn TextGenerator>` and lets tests script replies without a
//! network.

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::llm::{ChatRequest, LlmClient};

/// A synchronous-in-spirit, single-shot text generator.
///
/// Failures are returned as errors; implementations never substitute a
/// canned apology for a failed call.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self.chat(&ChatRequest::single_turn(prompt)).await?;
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "generation complete"
        );
        Ok(response.text.trim().to_string())
    }
}
