//! LLM integration layer.
//!
//! - [`types`] -- Provider-agnostic requests and replies.
//! - [`client`] -- HTTP client for the Anthropic and OpenAI APIs.

pub mod client;
pub mod types;

pub use client::{DEFAULT_TIMEOUT_SECS, LlmClient, LlmClientConfig, LlmProvider};
pub use types::{ChatRequest, ChatResponse, Usage};
