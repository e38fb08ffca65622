//! Intent classification and the task workflow engine for taskflow.
//!
//! This crate provides:
//!
//! - **Classification**: free task text to a typed [`Plan`] via
//!   [`classifier::IntentClassifier`].
//! - **Action dispatch**: one handler per [`Action`] via
//!   [`actions::ActionDispatcher`].
//! - **Workflow engine**: the `Load -> Classify -> Dispatch -> Persist` loop
//!   as an explicit edge table, run by [`workflow::WorkflowEngine`].

pub mod actions;
pub mod classifier;
pub mod error;
pub mod state;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use actions::{ActionDispatcher, ActionOutcome, UNKNOWN_INTENT_RESULT};
pub use classifier::{Action, INVALID_JSON_REASON, IntentClassifier, Plan, parse_plan};
pub use error::{IntentError, Result};
pub use state::{StatePatch, WorkflowState};
pub use workflow::{
    EDGES, Edge, EngineConfig, Guard, Node, PATH_WINDOW, RunSummary, Target, WorkflowEngine,
    next_target,
};
