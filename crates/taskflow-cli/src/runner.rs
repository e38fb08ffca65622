//! Store and engine wiring shared by the subcommands.
//!
//! The generator is passed in so a run can be driven without a live
//! provider.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::error;

use taskflow_agent::TextGenerator;
use taskflow_intent::{ActionDispatcher, IntentClassifier, RunSummary, WorkflowEngine};
use taskflow_store::{TaskRecordStore, open_store};

use crate::config::TaskflowConfig;

/// Open the store named by `config` with its retry policy.
pub async fn open_configured_store(config: &TaskflowConfig) -> Result<Arc<dyn TaskRecordStore>> {
    open_store(&config.store.location, config.retry_policy())
        .await
        .with_context(|| {
            format!(
                "failed to open task store {}",
                config.store.location.display()
            )
        })
}

/// Drain the configured store until no pending rows remain.
///
/// Prints the start and completion notices. Any engine error is returned
/// with "workflow aborted" context.
pub async fn run_workflow(
    config: &TaskflowConfig,
    generator: Arc<dyn TextGenerator>,
) -> Result<RunSummary> {
    let store = open_configured_store(config).await?;

    let engine = WorkflowEngine::new(
        store.clone(),
        IntentClassifier::new(generator.clone()),
        ActionDispatcher::new(generator).with_base_dir(&config.actions.base_dir),
        config.engine_config(),
    );

    println!("Workflow started: processing tasks from {}", store.location());

    let summary = engine
        .run()
        .await
        .inspect_err(|e| error!(error = %e, "workflow aborted"))
        .context("workflow aborted")?;

    println!(
        "Workflow complete: {} task(s) processed ({} done, {} failed)",
        summary.cycles, summary.done, summary.failed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use taskflow_agent::AgentError;

    use super::*;

    /// Classifies everything as a question and answers with a fixed string,
    /// or fails every call.
    struct CannedGenerator {
        fail: bool,
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str) -> taskflow_agent::Result<String> {
            if self.fail {
                return Err(AgentError::LlmRequestFailed {
                    reason: "connection refused".into(),
                });
            }
            if prompt.contains("Return ONLY valid JSON") {
                Ok(r#"{"action": "question", "reason": "asks"}"#.to_string())
            } else {
                Ok("42".to_string())
            }
        }
    }

    fn config_for(dir: &Path, rows: Value) -> TaskflowConfig {
        let location = dir.join("tasks.json");
        std::fs::write(&location, rows.to_string()).unwrap();

        let mut config = TaskflowConfig::default();
        config.store.location = location;
        config.actions.base_dir = dir.to_path_buf();
        config
    }

    fn stored_rows(config: &TaskflowConfig) -> Vec<Value> {
        serde_json::from_str(&std::fs::read_to_string(&config.store.location).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn run_halts_and_persists_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(
            dir.path(),
            json!([
                { "task_input": "meaning of life?", "status": "" },
                { "task_input": "already", "status": "done", "result": "x" },
            ]),
        );

        let summary = run_workflow(&config, Arc::new(CannedGenerator { fail: false }))
            .await
            .unwrap();

        assert_eq!((summary.cycles, summary.done, summary.failed), (1, 1, 0));
        let rows = stored_rows(&config);
        assert_eq!(rows[0]["status"], "done");
        assert_eq!(rows[0]["result"], "42");
        assert_eq!(rows[1]["result"], "x");
    }

    #[tokio::test]
    async fn failing_generator_aborts_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), json!([{ "task_input": "q", "status": "" }]));

        let err = run_workflow(&config, Arc::new(CannedGenerator { fail: true }))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "workflow aborted");
        assert!(format!("{err:#}").contains("connection refused"));
        assert_eq!(stored_rows(&config)[0]["status"], "");
    }

    #[tokio::test]
    async fn unreadable_store_aborts_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TaskflowConfig::default();
        config.store.location = dir.path().join("absent.json");

        let err = run_workflow(&config, Arc::new(CannedGenerator { fail: false }))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "workflow aborted");
    }
}
