use crate::config::Config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Load the sales file into the store and serve refresh requests
#[derive(Parser, Debug)]
#[command(name = "sales-ingest")]
#[command(about = "Ingest sales records into a relational store", long_about = None)]
pub struct CliArgs {
    /// Store connection URL
    #[arg(
        long = "database-url",
        value_name = "URL",
        global = true,
        help = "SQLite connection URL (default: $DATABASE_URL or sqlite://data/sales.db)"
    )]
    pub database_url: Option<String>,

    /// Sales file to ingest
    #[arg(
        long = "source",
        value_name = "PATH",
        global = true,
        help = "Path to the sales CSV file (default: $SALES_SOURCE_PATH or ./data/data.csv)"
    )]
    pub source: Option<PathBuf>,

    /// Number of records per batch
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        global = true,
        help = "Records per upsert batch (default: 1000, max: 3000)"
    )]
    pub batch_size: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run one refresh and exit
    Refresh,
    /// Run the HTTP host
    Serve(ServeArgs),
}

/// Options for the `serve` subcommand
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to bind
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Skip the refresh normally launched at startup
    #[arg(long = "no-startup-refresh")]
    pub no_startup_refresh: bool,
}

impl CliArgs {
    /// Overlay command-line values onto configuration loaded from the environment
    ///
    /// Flags that were not given leave the configured value untouched.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        if let Some(source) = &self.source {
            config.source.path = source.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.source.batch_size = batch_size;
        }

        if let Command::Serve(serve) = &self.command {
            if let Some(host) = &serve.host {
                config.server.host = host.clone();
            }
            if let Some(port) = serve.port {
                config.server.port = port;
            }
            if serve.no_startup_refresh {
                config.server.refresh_on_startup = false;
            }
        }
    }
}
