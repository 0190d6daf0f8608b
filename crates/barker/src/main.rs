// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Barker - delivery dispatch engine for Telegram bot broadcasts.
//!
//! This is the binary entry point: the HTTP gateway (`serve`), the gateway
//! probe (`status`), and the worker/admin commands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;
mod status;
mod worker;

use std::path::PathBuf;

use barker_config::model::BarkerConfig;
use barker_core::{Backend, BarkerError};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::worker::WorkerCommand;

/// Barker - delivery dispatch engine for Telegram bot broadcasts.
#[derive(Parser, Debug)]
#[command(name = "barker", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Send worker commands to the gateway in `[client]` even when
    /// a local database is available.
    #[arg(long, global = true)]
    remote: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the local ledger over HTTP.
    Serve,
    /// Show whether a gateway is running.
    Status {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Print the effective configuration with secrets redacted.
    Config,
    #[command(flatten)]
    Worker(WorkerCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => barker_config::load_and_validate_path(path),
        None => barker_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            barker_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    if let Err(e) = run(cli, config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: BarkerConfig) -> Result<(), BarkerError> {
    match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        Some(Commands::Config) => {
            println!("{}", render_config(&config)?);
            Ok(())
        }
        Some(Commands::Worker(command)) => {
            let ledger = worker::open_ledger(&config, cli.remote).await?;
            let result = worker::execute(ledger.as_ref(), &command).await;
            ledger.shutdown().await?;
            let value = result?;
            let rendered = serde_json::to_string_pretty(&value)
                .map_err(|e| BarkerError::Internal(format!("failed to render output: {e}")))?;
            println!("{rendered}");
            Ok(())
        }
        None => {
            println!("barker: use --help for available commands");
            Ok(())
        }
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins over `[log] level`.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "barker={log_level},barker_core={log_level},barker_storage={log_level},\
             barker_gateway={log_level},barker_client={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

/// Effective configuration as TOML, bearer tokens replaced.
fn render_config(config: &BarkerConfig) -> Result<String, BarkerError> {
    let mut shown = config.clone();
    if shown.server.bearer_token.is_some() {
        shown.server.bearer_token = Some("[redacted]".to_string());
    }
    if shown.client.bearer_token.is_some() {
        shown.client.bearer_token = Some("[redacted]".to_string());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| BarkerError::Internal(format!("failed to render config: {e}")))
}
