// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recall - long-term semantic memory for conversational agents.
//!
//! This is the binary entry point. Data subcommands print JSON to stdout;
//! logs go to stderr.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod services;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use recall_config::{ConfigError, RecallConfig};
use recall_core::RecallError;
use tracing::error;

use crate::commands::Command;
use crate::services::Services;

/// Recall - long-term semantic memory for conversational agents.
#[derive(Parser, Debug)]
#[command(name = "recall", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the resolved configuration as TOML.
    Config,
    /// Purge expired documents on an interval until interrupted.
    Maintain,
    #[command(flatten)]
    Run(Command),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            recall_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.service.log_level);
    recall_memory::metrics::register_metrics();

    let result = match cli.command {
        Commands::Config => print_config(&config),
        Commands::Maintain => services::run_maintenance(&config, shutdown_signal()).await,
        Commands::Run(command) => run(&config, command).await,
    };
    if let Err(e) = result {
        error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<RecallConfig, Vec<ConfigError>> {
    match path {
        Some(path) => recall_config::load_and_validate_path(path),
        None => recall_config::load_and_validate(),
    }
}

async fn run(config: &RecallConfig, command: Command) -> Result<(), RecallError> {
    let services = Services::connect(config).await?;
    let output = commands::execute(&services, command).await?;
    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|e| RecallError::Internal(format!("failed to render output: {e}")))?;
    println!("{rendered}");
    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed the error is
/// logged and maintenance stops right away.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}

fn print_config(config: &RecallConfig) -> Result<(), RecallError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| RecallError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// Initialize the tracing subscriber on stderr.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies to the
/// recall crates and everything else logs warnings only.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("recall={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
