//! Workflow engine: drains the task store one row per cycle.
//!
//! The graph is data: [`EDGES`] lists every transition with the guard that
//! enables it, and [`WorkflowEngine::run`] interprets that table. One cycle is
//!
//! ```text
//! Load ──has_more──▶ Classify ──action──▶ Dispatch(action) ──▶ Persist ─┐
//!  ▲  └──!has_more──▶ Halt                                              │
//!  └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Execution is strictly sequential. Any node error aborts the run; the next
//! run re-derives its position from the store.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use taskflow_store::{Outcome, TaskRecordStore};

use crate::actions::ActionDispatcher;
use crate::classifier::{Action, IntentClassifier};
use crate::error::{IntentError, Result};
use crate::state::{StatePatch, WorkflowState};

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// A node of the workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Fetch the next pending row.
    Load,
    /// Ask the classifier for a plan.
    Classify,
    /// Run the handler for one action.
    Dispatch(Action),
    /// Write the outcome back to the store.
    Persist,
}

impl Node {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Load => "load_task",
            Self::Classify => "interpret_intent",
            Self::Dispatch(action) => action.as_str(),
            Self::Persist => "update_store",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where an edge leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Node(Node),
    Halt,
}

/// Condition under which an edge is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Always,
    HasMore(bool),
    /// Matches only when a plan is present and names this action.
    ActionIs(Action),
}

impl Guard {
    pub fn matches(&self, state: &WorkflowState) -> bool {
        match self {
            Self::Always => true,
            Self::HasMore(expected) => state.has_more == *expected,
            Self::ActionIs(action) => state.plan.as_ref().is_some_and(|p| p.action == *action),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: Node,
    pub guard: Guard,
    pub to: Target,
}

const fn edge(from: Node, guard: Guard, to: Target) -> Edge {
    Edge { from, guard, to }
}

/// Every transition of the graph. The first matching edge wins.
pub const EDGES: [Edge; 11] = [
    edge(Node::Load, Guard::HasMore(false), Target::Halt),
    edge(Node::Load, Guard::HasMore(true), Target::Node(Node::Classify)),
    edge(
        Node::Classify,
        Guard::ActionIs(Action::MakeFolder),
        Target::Node(Node::Dispatch(Action::MakeFolder)),
    ),
    edge(
        Node::Classify,
        Guard::ActionIs(Action::Search),
        Target::Node(Node::Dispatch(Action::Search)),
    ),
    edge(
        Node::Classify,
        Guard::ActionIs(Action::Question),
        Target::Node(Node::Dispatch(Action::Question)),
    ),
    edge(
        Node::Classify,
        Guard::ActionIs(Action::Unknown),
        Target::Node(Node::Dispatch(Action::Unknown)),
    ),
    edge(Node::Dispatch(Action::MakeFolder), Guard::Always, Target::Node(Node::Persist)),
    edge(Node::Dispatch(Action::Search), Guard::Always, Target::Node(Node::Persist)),
    edge(Node::Dispatch(Action::Question), Guard::Always, Target::Node(Node::Persist)),
    edge(Node::Dispatch(Action::Unknown), Guard::Always, Target::Node(Node::Persist)),
    edge(Node::Persist, Guard::Always, Target::Node(Node::Load)),
];

/// Pick the outgoing edge of `from` for the current state.
pub fn next_target(from: Node, state: &WorkflowState) -> Result<Target> {
    EDGES
        .iter()
        .find(|e| e.from == from && e.guard.matches(state))
        .map(|e| e.to)
        .ok_or_else(|| IntentError::InvalidWorkflowState {
            node: from.name(),
            reason: "no outgoing edge matches the current state".into(),
        })
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Tunables for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Stop with an error after this many cycles if rows are still pending.
    /// `None` means no limit.
    pub max_cycles: Option<u32>,
}

/// How many trailing nodes [`RunSummary::path`] keeps.
pub const PATH_WINDOW: usize = 32;

/// What one run did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    /// Completed cycles, one per persisted row.
    pub cycles: u32,
    pub done: u32,
    pub failed: u32,
    /// The last [`PATH_WINDOW`] nodes visited, oldest first.
    pub path: VecDeque<Node>,
    /// State at `Halt`.
    pub state: WorkflowState,
}

impl RunSummary {
    fn record(&mut self, node: Node) {
        if self.path.len() == PATH_WINDOW {
            self.path.pop_front();
        }
        self.path.push_back(node);
    }
}

/// Interprets [`EDGES`] against a store, a classifier and a dispatcher.
pub struct WorkflowEngine {
    store: Arc<dyn TaskRecordStore>,
    classifier: IntentClassifier,
    dispatcher: ActionDispatcher,
    config: EngineConfig,
}

impl WorkflowEngine {
    pub fn new(
        store: Arc<dyn TaskRecordStore>,
        classifier: IntentClassifier,
        dispatcher: ActionDispatcher,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            classifier,
            dispatcher,
            config,
        }
    }

    /// Run from `Load` until `Halt`.
    ///
    /// Every call starts from a fresh [`WorkflowState`]. The first node error
    /// aborts the run and is returned as-is.
    pub async fn run(&self) -> Result<RunSummary> {
        let run_id = Uuid::now_v7();
        let span = info_span!("workflow_run", %run_id, store = %self.store.location());
        self.drive(run_id).instrument(span).await
    }

    async fn drive(&self, run_id: Uuid) -> Result<RunSummary> {
        let mut state = WorkflowState::new(self.store.location());
        let mut summary = RunSummary {
            run_id,
            cycles: 0,
            done: 0,
            failed: 0,
            path: VecDeque::with_capacity(PATH_WINDOW),
            state: state.clone(),
        };

        info!("workflow run started");
        let mut node = Node::Load;

        loop {
            summary.record(node);
            let patch = self.step(node, &state).await?;
            debug!(node = %node, keys = ?patch.keys(), "node finished");
            state.apply(patch);

            if node == Node::Persist {
                summary.cycles += 1;
                match state.status {
                    Some(Outcome::Done) => summary.done += 1,
                    Some(Outcome::Failed) => summary.failed += 1,
                    None => {}
                }
            }

            node = match next_target(node, &state)? {
                Target::Halt => break,
                Target::Node(Node::Classify) => {
                    self.check_cycle_limit(summary.cycles)?;
                    Node::Classify
                }
                Target::Node(next) => next,
            };
        }

        info!(
            cycles = summary.cycles,
            done = summary.done,
            failed = summary.failed,
            "workflow run complete"
        );
        summary.state = state;
        Ok(summary)
    }

    /// Refuse to start another cycle once `max_cycles` have completed.
    fn check_cycle_limit(&self, cycles: u32) -> Result<()> {
        match self.config.max_cycles {
            Some(max) if cycles >= max => {
                warn!(max_cycles = max, "cycle limit reached with rows pending");
                Err(IntentError::CycleLimitExceeded { max_cycles: max })
            }
            _ => Ok(()),
        }
    }

    async fn step(&self, node: Node, state: &WorkflowState) -> Result<StatePatch> {
        match node {
            Node::Load => self.load().await,
            Node::Classify => self.classify(state).await,
            Node::Dispatch(action) => self.dispatch(action, state).await,
            Node::Persist => self.persist(state).await,
        }
    }

    async fn load(&self) -> Result<StatePatch> {
        match self.store.load_next_pending().await? {
            Some(task) => {
                info!(row = %task.id, input = task.input(), "task loaded");
                Ok(StatePatch::new().task(task).has_more(true))
            }
            None => {
                info!("no pending tasks left");
                Ok(StatePatch::new().has_more(false))
            }
        }
    }

    async fn classify(&self, state: &WorkflowState) -> Result<StatePatch> {
        let task = required(state.task.as_ref(), Node::Classify, "task")?;
        let plan = self.classifier.classify(task.input()).await?;
        Ok(StatePatch::new().plan(plan))
    }

    async fn dispatch(&self, action: Action, state: &WorkflowState) -> Result<StatePatch> {
        let task = required(state.task.as_ref(), Node::Dispatch(action), "task")?;
        let outcome = self.dispatcher.dispatch(action, task).await?;
        Ok(StatePatch::new().outcome(outcome.result, outcome.status))
    }

    async fn persist(&self, state: &WorkflowState) -> Result<StatePatch> {
        let id = *required(state.current_row_id.as_ref(), Node::Persist, "current_row_id")?;
        let status = *required(state.status.as_ref(), Node::Persist, "status")?;
        let result = required(state.result.as_ref(), Node::Persist, "result")?;

        self.store.persist(id, status, result).await?;
        info!(row = %id, %status, "task updated");
        Ok(StatePatch::new())
    }
}

fn required<'a, T>(value: Option<&'a T>, node: Node, field: &str) -> Result<&'a T> {
    value.ok_or_else(|| IntentError::InvalidWorkflowState {
        node: node.name(),
        reason: format!("`{field}` is not set"),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
