//! CLI argument definitions for taskflow.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// taskflow -- drain a task queue through an LLM-driven workflow.
#[derive(Parser)]
#[command(
    name = "taskflow",
    version,
    about = "taskflow -- LLM-classified task queue runner",
    long_about = "Reads pending tasks from a SQLite or JSON store, classifies each one with an \
                  LLM, runs the matching action and writes the result back until nothing is \
                  left to do."
)]
pub struct Cli {
    /// Path to the TOML config file (default: ./taskflow.toml if present).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Task store location (`*.json` for a JSON file, anything else is SQLite).
    #[arg(long, short, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process pending tasks until the store has none left.
    Run(RunArgs),

    /// Append pending tasks to the store.
    Add {
        /// One task per argument.
        #[arg(required = true)]
        tasks: Vec<String>,
    },

    /// Print every task row with its status and result.
    List,
}

impl Commands {
    /// Log level used when `RUST_LOG` is unset.
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Self::Run(_) => "info",
            Self::Add { .. } | Self::List => "warn",
        }
    }
}

#[derive(Args, Default)]
pub struct RunArgs {
    /// Stop retrying a failed task after this many attempts (0 = never stop).
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Directory that `make_folder` paths are created under.
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Abort if rows are still pending after this many cycles (0 = no limit).
    #[arg(long)]
    pub max_cycles: Option<u32>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_logs_at_info_and_others_at_warn() {
        let level = |args: &[&str]| Cli::parse_from(args).command.default_log_level();
        assert_eq!(level(&["taskflow", "run"]), "info");
        assert_eq!(level(&["taskflow", "add", "x"]), "warn");
        assert_eq!(level(&["taskflow", "list"]), "warn");
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::parse_from([
            "taskflow",
            "run",
            "--store",
            "queue.json",
            "--max-attempts",
            "0",
            "--base-dir",
            "/tmp/out",
        ]);
        assert_eq!(cli.store, Some(PathBuf::from("queue.json")));
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.max_attempts, Some(0));
        assert_eq!(args.base_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(args.max_cycles, None);
    }

    #[test]
    fn add_requires_text() {
        assert!(Cli::try_parse_from(["taskflow", "add"]).is_err());
        let cli = Cli::parse_from(["taskflow", "add", "notes", "capital of France?"]);
        let Commands::Add { tasks } = cli.command else {
            panic!("expected add");
        };
        assert_eq!(tasks, vec!["notes", "capital of France?"]);
    }
}
