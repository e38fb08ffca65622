//! Intent classifier: turns free task text into a typed [`Plan`].
//!
//! The classifier asks the generation capability for strict JSON and then
//! validates the reply. The reply is never trusted as well-typed: anything
//! that does not parse into one of the four known actions becomes an
//! [`Action::Unknown`] plan. Only a failed generation call is an error.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use taskflow_agent::TextGenerator;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The closed set of actions a task can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create the directory named by the task text.
    MakeFolder,
    /// Research and summarize the task text.
    Search,
    /// Answer the task text as a direct question.
    Question,
    /// Intent could not be determined.
    Unknown,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::MakeFolder,
        Action::Search,
        Action::Question,
        Action::Unknown,
    ];

    /// The wire name used in classifier replies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MakeFolder => "make_folder",
            Self::Search => "search",
            Self::Question => "question",
            Self::Unknown => "unknown",
        }
    }

    /// Exact match against the wire names.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structured result of classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub action: Action,
    pub reason: String,
}

/// Reason attached to the fallback plan when the reply is not usable JSON.
pub const INVALID_JSON_REASON: &str = "Invalid JSON from LLM";

impl Plan {
    pub fn new(action: Action, reason: impl Into<String>) -> Self {
        Self {
            action,
            reason: reason.into(),
        }
    }

    /// The fallback for malformed replies or replies without an `action`.
    pub fn invalid_json() -> Self {
        Self::new(Action::Unknown, INVALID_JSON_REASON)
    }
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

const CLASSIFY_PROMPT: &str = r#"You are an intent understanding agent.

Understand the user's intent and choose ONE action.

Available actions:
- make_folder → user wants to create a directory or folder
- search → user wants information, research, or summary
- question → user asks a direct question
- unknown → unclear intent

Return ONLY valid JSON.

JSON format:
{
  "action": "make_folder | search | question | unknown",
  "reason": "short explanation"
}

User input:
"#;

/// Build the classification prompt for one task.
pub fn build_prompt(text: &str) -> String {
    format!("{CLASSIFY_PROMPT}{text}\n")
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Classifies task text through an injected [`TextGenerator`].
#[derive(Clone)]
pub struct IntentClassifier {
    generator: Arc<dyn TextGenerator>,
}

impl IntentClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Classify `text` into a [`Plan`].
    ///
    /// Blank text is classified as unknown without calling the generator.
    /// A generation failure is returned as an error and is fatal for the
    /// current cycle.
    pub async fn classify(&self, text: &str) -> Result<Plan> {
        let text = text.trim();
        if text.is_empty() {
            warn!("task has no text to classify");
            return Ok(Plan::new(Action::Unknown, "Task has no task_input"));
        }

        debug!(text, "classifying task");
        let raw = self.generator.generate(&build_prompt(text)).await?;
        let plan = parse_plan(&raw);

        info!(action = %plan.action, reason = %plan.reason, "task classified");
        Ok(plan)
    }
}

/// Parse a raw classifier reply.
///
/// Accepts the JSON bare or wrapped in a markdown code fence. Malformed JSON,
/// a non-object, or a missing/non-string `action` yields
/// [`Plan::invalid_json`]. An `action` outside the known set yields an
/// unknown plan naming the offending value. A missing `reason` reads as empty.
pub fn parse_plan(raw: &str) -> Plan {
    let value: Value = match serde_json::from_str(strip_code_fence(raw)) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "classifier reply is not JSON");
            return Plan::invalid_json();
        }
    };

    let Some(name) = value.get("action").and_then(Value::as_str) else {
        return Plan::invalid_json();
    };

    match Action::from_name(name) {
        Some(action) => Plan::new(
            action,
            value
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        ),
        None => {
            warn!(action = name, "classifier returned an unrecognized action");
            Plan::new(
                Action::Unknown,
                format!("Unrecognized action from LLM: {name}"),
            )
        }
    }
}

/// Strip optional markdown code fences that models sometimes emit.
fn strip_code_fence(text: &str) -> &str {
    let cleaned = text.trim();
    let cleaned = cleaned.strip_prefix("```json").unwrap_or(cleaned);
    let cleaned = cleaned.strip_prefix("```").unwrap_or(cleaned);
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned);
    cleaned.trim()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;

    #[test]
    fn recognized_actions_are_returned_unchanged() {
        for action in Action::ALL {
            let raw = format!(r#"{{"action": "{action}", "reason": "because"}}"#);
            assert_eq!(parse_plan(&raw), Plan::new(action, "because"));
        }
    }

    #[test]
    fn code_fenced_reply_is_accepted() {
        let raw = "```json\n{\"action\": \"make_folder\", \"reason\": \"dir\"}\n```";
        assert_eq!(parse_plan(raw).action, Action::MakeFolder);
    }

    #[test]
    fn non_json_falls_back() {
        assert_eq!(parse_plan("Sure! I think it's a question."), Plan::invalid_json());
        assert_eq!(parse_plan(""), Plan::invalid_json());
    }

    #[test]
    fn missing_or_non_string_action_falls_back() {
        assert_eq!(parse_plan(r#"{"reason": "x"}"#), Plan::invalid_json());
        assert_eq!(parse_plan(r#"{"action": 3}"#), Plan::invalid_json());
        assert_eq!(parse_plan(r#"["search"]"#), Plan::invalid_json());
    }

    #[test]
    fn unrecognized_action_is_unknown() {
        let plan = parse_plan(r#"{"action": "delete_everything", "reason": "x"}"#);
        assert_eq!(plan.action, Action::Unknown);
        assert!(plan.reason.contains("delete_everything"));

        let echoed = parse_plan(r#"{"action": "make_folder | search | question | unknown"}"#);
        assert_eq!(echoed.action, Action::Unknown);
    }

    #[test]
    fn missing_reason_reads_as_empty() {
        assert_eq!(
            parse_plan(r#"{"action": "question"}"#),
            Plan::new(Action::Question, "")
        );
    }

    #[test]
    fn prompt_lists_every_action_and_embeds_input() {
        let prompt = build_prompt("notes");
        for action in Action::ALL {
            assert!(prompt.contains(action.as_str()));
        }
        assert!(prompt.trim_end().ends_with("notes"));
    }

    #[tokio::test]
    async fn classify_sends_prompt_and_parses_reply() {
        let generator = ScriptedGenerator::new([r#"{"action": "search", "reason": "info"}"#]);
        let classifier = IntentClassifier::new(generator.clone());

        let plan = classifier.classify("rust async runtimes").await.unwrap();
        assert_eq!(plan, Plan::new(Action::Search, "info"));

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("rust async runtimes"));
    }

    #[tokio::test]
    async fn blank_text_skips_the_generator() {
        let generator = ScriptedGenerator::new(Vec::<&str>::new());
        let classifier = IntentClassifier::new(generator.clone());

        let plan = classifier.classify("   ").await.unwrap();
        assert_eq!(plan.action, Action::Unknown);
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn generation_failure_is_an_error() {
        let generator = ScriptedGenerator::failing();
        let classifier = IntentClassifier::new(generator);
        assert!(classifier.classify("anything").await.is_err());
    }
}
