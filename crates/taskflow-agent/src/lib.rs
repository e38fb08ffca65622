//! LLM access for taskflow.
//!
//! ## Modules
//!
//! - [`llm`] -- LLM client and wire types.
//! - [`generator`] -- The [`TextGenerator`] capability the workflow depends on.
//! - [`error`] -- Agent error types.

pub mod error;
pub mod generator;
pub mod llm;

pub use error::{AgentError, Result};
pub use generator::TextGenerator;
pub use llm::{ChatRequest, ChatResponse, LlmClient, LlmClientConfig, LlmProvider, Usage};
