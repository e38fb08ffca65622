//! Action handlers: one per [`Action`] variant.
//!
//! Handlers turn a classified task into an [`ActionOutcome`]. Local failures
//! (a directory that cannot be created, an unclassifiable task) become a
//! `failed` outcome and are persisted like any other result. Failures of the
//! generation capability are returned as errors.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use taskflow_agent::TextGenerator;
use taskflow_store::{Outcome, TaskRow};

use crate::classifier::Action;
use crate::error::Result;

/// Result text stored for tasks whose intent could not be determined.
pub const UNKNOWN_INTENT_RESULT: &str = "Could not understand the intent";

/// What a handler produced for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub result: String,
    pub status: Outcome,
}

impl ActionOutcome {
    pub fn done(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            status: Outcome::Done,
        }
    }

    pub fn failed(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            status: Outcome::Failed,
        }
    }
}

/// Routes a task to the handler for its classified action.
#[derive(Clone)]
pub struct ActionDispatcher {
    generator: Arc<dyn TextGenerator>,
    base_dir: PathBuf,
}

impl ActionDispatcher {
    /// Create a dispatcher that resolves folder paths against the current
    /// working directory.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            base_dir: PathBuf::from("."),
        }
    }

    /// Resolve relative `make_folder` paths against `base_dir`.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub async fn dispatch(&self, action: Action, task: &TaskRow) -> Result<ActionOutcome> {
        debug!(row = %task.id, %action, "dispatching task");
        match action {
            Action::MakeFolder => Ok(self.make_folder(task.input()).await),
            Action::Search => self.search(task.input()).await,
            Action::Question => self.question(task.input()).await,
            Action::Unknown => Ok(Self::unknown()),
        }
    }

    async fn make_folder(&self, input: &str) -> ActionOutcome {
        let input = input.trim();
        if input.is_empty() {
            warn!("make_folder called without a path");
            return ActionOutcome::failed("No folder path given");
        }

        let path = self.base_dir.join(input);
        match tokio::fs::create_dir_all(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "folder created");
                ActionOutcome::done(format!("Folder created successfully: {input}"))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "folder creation failed");
                ActionOutcome::failed(e.to_string())
            }
        }
    }

    async fn search(&self, input: &str) -> Result<ActionOutcome> {
        let prompt = format!("Search and summarize:\n{input}");
        let summary = self.generator.generate(&prompt).await?;
        Ok(ActionOutcome::done(summary))
    }

    async fn question(&self, input: &str) -> Result<ActionOutcome> {
        let answer = self.generator.generate(input).await?;
        Ok(ActionOutcome::done(answer))
    }

    fn unknown() -> ActionOutcome {
        ActionOutcome::failed(UNKNOWN_INTENT_RESULT)
    }
}
