//! Request and reply types for LLM calls.
//!
//! These types are provider-agnostic; [`super::client`] translates them into
//! the Anthropic or OpenAI wire format.

/// A single-turn completion request: one user prompt, one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// Model identifier. Empty means the client's default model.
    pub model: String,

    /// The user prompt sent as the only message.
    pub prompt: String,

    /// Maximum tokens the model may generate in this turn.
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// A single-turn request using the client's default model.
    pub fn single_turn(prompt: impl Into<String>) -> Self {
        Self {
            model: String::new(),
            prompt: prompt.into(),
            max_tokens: None,
        }
    }
}

/// Token usage reported by the provider, when available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A completed, non-streaming model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    /// Concatenated text content of the reply.
    pub text: String,
    pub usage: Usage,
}
