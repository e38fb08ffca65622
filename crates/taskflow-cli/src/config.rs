//! `taskflow.toml` loading and command-line overrides.
//!
//! Every section and key is optional; missing values fall back to the
//! defaults below. Credentials are never read from the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use taskflow_agent::llm::DEFAULT_TIMEOUT_SECS;
use taskflow_intent::EngineConfig;
use taskflow_store::RetryPolicy;

use crate::cli::RunArgs;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "taskflow.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskflowConfig {
    pub store: StoreSection,
    pub llm: LlmSection,
    pub actions: ActionsSection,
    pub engine: EngineSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub location: PathBuf,
    /// 0 keeps failed rows eligible forever.
    pub max_attempts: u32,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            location: PathBuf::from("tasks.db"),
            max_attempts: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmSection {
    /// Provider name; auto-detected from available API keys when unset.
    pub provider: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActionsSection {
    pub base_dir: PathBuf,
}

impl Default for ActionsSection {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    /// 0 means no limit.
    pub max_cycles: u32,
}

impl TaskflowConfig {
    /// Load the config file.
    ///
    /// An explicit `path` must exist. Without one, `taskflow.toml` in the
    /// working directory is used if present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply the global `--store` flag.
    pub fn override_store(&mut self, store: Option<PathBuf>) {
        if let Some(location) = store {
            self.store.location = location;
        }
    }

    /// Apply the `run` subcommand flags.
    pub fn override_run(&mut self, args: &RunArgs) {
        if let Some(n) = args.max_attempts {
            self.store.max_attempts = n;
        }
        if let Some(dir) = &args.base_dir {
            self.actions.base_dir = dir.clone();
        }
        if let Some(n) = args.max_cycles {
            self.engine.max_cycles = n;
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.store.max_attempts)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_cycles: (self.engine.max_cycles > 0).then_some(self.engine.max_cycles),
        }
    }
}
