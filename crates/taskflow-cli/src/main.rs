//! CLI entry point for taskflow.
//!
//! This binary provides the `taskflow` command with subcommands for draining
//! the task queue, seeding it, and inspecting it.

mod cli;
mod config;
mod helpers;
mod runner;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use taskflow_agent::{LlmClient, TextGenerator};
use taskflow_store::TaskStatus;

use crate::cli::{Cli, Commands, RunArgs};
use crate::config::TaskflowConfig;
use crate::helpers::{env_non_empty, init_tracing, resolve_llm_config};
use crate::runner::{open_configured_store, run_workflow};

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    // Before the config load so its logging is emitted.
    init_tracing(cli.command.default_log_level());

    let mut config = TaskflowConfig::load(cli.config.as_deref())?;
    config.override_store(cli.store);

    match cli.command {
        Commands::Run(args) => cmd_run(config, args).await,
        Commands::Add { tasks } => cmd_add(config, tasks).await,
        Commands::List => cmd_list(config).await,
    }
}

// ---------------------------------------------------------------------------
// Subcommand: run
// ---------------------------------------------------------------------------

async fn cmd_run(mut config: TaskflowConfig, args: RunArgs) -> Result<()> {
    config.override_run(&args);

    let llm_config = resolve_llm_config(&config.llm, env_non_empty)?;
    info!(
        provider = llm_config.provider.name(),
        model = %llm_config.default_model,
        "llm client configured"
    );
    let generator: Arc<dyn TextGenerator> =
        Arc::new(LlmClient::new(llm_config).context("failed to create LLM client")?);

    run_workflow(&config, generator).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: add
// ---------------------------------------------------------------------------

async fn cmd_add(config: TaskflowConfig, tasks: Vec<String>) -> Result<()> {
    let store = open_configured_store(&config).await?;

    for task in &tasks {
        let id = store
            .append(task)
            .await
            .with_context(|| format!("failed to add task {task:?}"))?;
        println!("  added #{id}: {task}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: list
// ---------------------------------------------------------------------------

async fn cmd_list(config: TaskflowConfig) -> Result<()> {
    let store = open_configured_store(&config).await?;
    let rows = store.list().await.context("failed to read tasks")?;
    let policy = config.retry_policy();

    println!();
    println!("  Tasks in {}", store.location());
    println!("  {}", "=".repeat(40));
    if rows.is_empty() {
        println!("  (no tasks)");
    }
    for row in &rows {
        let status = match row.status {
            TaskStatus::Pending => "pending",
            TaskStatus::Done => "done",
            TaskStatus::Failed if policy.is_row_pending(row) => "failed (will retry)",
            TaskStatus::Failed => "failed",
        };
        println!(
            "  #{:<4} {:<20} attempts={} {}",
            row.id.0,
            status,
            row.attempts,
            row.input()
        );
        if let Some(result) = row.result.as_deref().filter(|r| !r.is_empty()) {
            println!("        -> {}", result.lines().next().unwrap_or_default());
        }
    }
    println!();
    Ok(())
}
