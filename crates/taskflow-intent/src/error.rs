//! Workflow error types.
//!
//! Only infrastructure failures reach [`IntentError`]. Classification parse
//! problems and handler failures are converted to data (an `unknown` plan, a
//! `failed` outcome) before they get here, so any `IntentError` aborts the
//! current run.

/// Unified error type for the intent and workflow crate.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    // -- Upstream crate errors -----------------------------------------------
    /// The task record store could not be read or written.
    #[error("task store error: {0}")]
    Store(#[from] taskflow_store::StoreError),

    /// The text-generation capability failed.
    #[error("generation failed: {0}")]
    Generation(#[from] taskflow_agent::AgentError),

    // -- Workflow errors -----------------------------------------------------
    /// A node ran without the state it needs, or no edge leaves the node for
    /// the current state.
    #[error("invalid workflow state at `{node}`: {reason}")]
    InvalidWorkflowState { node: &'static str, reason: String },

    /// The run processed the configured maximum number of cycles and rows
    /// were still pending.
    #[error("cycle limit of {max_cycles} reached with rows still pending")]
    CycleLimitExceeded { max_cycles: u32 },
}

/// Convenience alias used throughout the intent crate.
pub type Result<T> = std::result::Result<T, IntentError>;
