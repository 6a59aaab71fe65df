//! Sales Ingest CLI
//!
//! Loads a sales CSV file into a SQLite store.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- refresh
//! cargo run -- --source data/data.csv --batch-size 500 refresh
//! cargo run -- serve --port 8080
//! cargo run -- serve --no-startup-refresh
//! ```
//!
//! Settings are read from the environment (and `.env`) first; flags
//! override them.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (bad configuration, store unavailable, refresh failed, etc.)

use anyhow::Context;
use sales_ingest::cli::{self, Command};
use sales_ingest::config::Config;
use sales_ingest::core::{RefreshCoordinator, Trigger};
use sales_ingest::db;
use sales_ingest::logging::{init_logging, LogConfig};
use sales_ingest::server;
use std::process;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = cli::parse_args();

    let mut config = Config::from_env()?;
    init_logging(&LogConfig::from_env()?)?;

    args.apply_to(&mut config);
    config.validate()?;

    let pool = db::connect(&config.database.url, config.database.max_connections)
        .await
        .with_context(|| format!("Failed to connect to {}", config.database.url))?;
    db::migrate(&pool)
        .await
        .context("Failed to run database migrations")?;

    let coordinator = Arc::new(RefreshCoordinator::new(
        pool,
        config.source.path.clone(),
        config.batch_config(),
    ));

    match args.command {
        Command::Refresh => {
            let cancel = CancellationToken::new();
            let interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, rolling back refresh");
                    interrupt.cancel();
                }
            });

            coordinator.refresh(Trigger::Cli, &cancel).await?;
        }
        Command::Serve(_) => server::serve(&config.server, coordinator).await?,
    }

    Ok(())
}
