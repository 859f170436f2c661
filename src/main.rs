//! Bridge server.
//!
//! A payment gateway in front of the Stellar network: it signs and submits
//! transactions for configured accounts, watches a receiving account for
//! incoming payments and forwards them to a callback.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                    BRIDGE SERVER                     │
//!                 │                                                      │
//!   HTTP client   │  ┌──────────┐   ┌────────────┐   ┌───────────────┐   │
//!   ──────────────┼─▶│   http   │──▶│  handlers  │──▶│   submitter   │───┼──▶ Horizon
//!                 │  │  server  │   │ (services) │   │ (sequencing)  │   │
//!                 │  └──────────┘   └─────┬──────┘   └───────┬───────┘   │
//!                 │                       │                  │           │
//!                 │                       ▼                  ▼           │
//!                 │                ┌────────────┐     ┌─────────────┐    │
//!                 │                │ discovery  │     │     db      │    │
//!                 │                │ federation │     │ (sea-orm)   │    │
//!                 │                └────────────┘     └──────▲──────┘    │
//!                 │                                          │           │
//!   Receive       │                                  ┌───────┴───────┐   │
//!   callback  ◀───┼──────────────────────────────────│   listener    │◀──┼─── Horizon
//!                 │                                  │  (poll loop)  │   │
//!                 │                                  └───────────────┘   │
//!                 │                                                      │
//!                 │  lifecycle: run mode → init steps → graph → serve    │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use bridge_server::lifecycle::{self, RunMode};
use bridge_server::observability::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "bridge", about = "Stellar bridge server", disable_version_flag = true)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "bridge.cfg")]
    config: PathBuf,

    /// Apply pending database migrations and exit
    #[arg(long = "migrate-db", conflicts_with = "version")]
    migrate_db: bool,

    /// Print the version and exit
    #[arg(short = 'v', long)]
    version: bool,

    /// Log output format: pretty or json
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let mode = RunMode::from_flags(cli.migrate_db, cli.version);

    if mode != RunMode::Version {
        init_logging(cli.log_format);
        tracing::info!(version = env!("CARGO_PKG_VERSION"), ?mode, "bridge server starting");
    }

    match lifecycle::run(&cli.config, mode).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal startup error");
            ExitCode::FAILURE
        }
    }
}
