//! Workflow state and the partial updates nodes emit.
//!
//! Every node reads the current [`WorkflowState`] and returns a
//! [`StatePatch`]. The engine merges the patch with [`WorkflowState::apply`]:
//! fields the patch sets overwrite, everything else is kept.

use serde::{Deserialize, Serialize};

use taskflow_store::{Outcome, RowId, TaskRow};

use crate::classifier::Plan;

/// The record threaded through every node of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Display form of the backing store. Fixed for the run.
    pub store_location: String,
    pub current_row_id: Option<RowId>,
    pub task: Option<TaskRow>,
    pub plan: Option<Plan>,
    pub result: Option<String>,
    pub status: Option<Outcome>,
    /// `true` while a pending row was found by the last load.
    pub has_more: bool,
}

impl WorkflowState {
    pub fn new(store_location: impl Into<String>) -> Self {
        Self {
            store_location: store_location.into(),
            current_row_id: None,
            task: None,
            plan: None,
            result: None,
            status: None,
            has_more: true,
        }
    }

    /// Shallow merge: overwrite exactly the fields `patch` sets.
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(id) = patch.current_row_id {
            self.current_row_id = Some(id);
        }
        if let Some(task) = patch.task {
            self.task = Some(task);
        }
        if let Some(plan) = patch.plan {
            self.plan = Some(plan);
        }
        if let Some(result) = patch.result {
            self.result = Some(result);
        }
        if let Some(status) = patch.status {
            self.status = Some(status);
        }
        if let Some(has_more) = patch.has_more {
            self.has_more = has_more;
        }
    }
}

/// A partial update to [`WorkflowState`].
///
/// `store_location` is deliberately absent: no node may change it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    pub current_row_id: Option<RowId>,
    pub task: Option<TaskRow>,
    pub plan: Option<Plan>,
    pub result: Option<String>,
    pub status: Option<Outcome>,
    pub has_more: Option<bool>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(mut self, task: TaskRow) -> Self {
        self.current_row_id = Some(task.id);
        self.task = Some(task);
        self
    }

    pub fn plan(mut self, plan: Plan) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn outcome(mut self, result: impl Into<String>, status: Outcome) -> Self {
        self.result = Some(result.into());
        self.status = Some(status);
        self
    }

    pub fn has_more(mut self, has_more: bool) -> Self {
        self.has_more = Some(has_more);
        self
    }

    /// Names of the fields this patch sets, for logging.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.current_row_id.is_some() {
            keys.push("current_row_id");
        }
        if self.task.is_some() {
            keys.push("task");
        }
        if self.plan.is_some() {
            keys.push("plan");
        }
        if self.result.is_some() {
            keys.push("result");
        }
        if self.status.is_some() {
            keys.push("status");
        }
        if self.has_more.is_some() {
            keys.push("has_more");
        }
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}
