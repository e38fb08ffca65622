//! Agent error types.
//!
//! Everything that can go wrong while talking to a generation provider is
//! surfaced through [`AgentError`]. Callers in the workflow engine treat
//! every variant as fatal for the current cycle.

/// Unified error type for the LLM layer.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    // -- LLM errors ----------------------------------------------------------
    /// An HTTP request to the LLM provider failed (transport, timeout, or a
    /// non-success status).
    #[error("llm request failed: {reason}")]
    LlmRequestFailed { reason: String },

    /// The provider answered, but not in the expected shape.
    #[error("llm response parse error: {reason}")]
    LlmParseFailed { reason: String },

    /// The API key is missing for a provider that requires one.
    #[error("missing api key for provider: {provider}")]
    MissingApiKey { provider: String },
}

/// Convenience alias used throughout the agent crate.
pub type Result<T> = std::result::Result<T, AgentError>;

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        Self::LlmRequestFailed {
            reason: err.to_string(),
        }
    }
}
