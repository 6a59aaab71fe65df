//! Command-line interface
//!
//! Global store and source flags plus the `refresh` and `serve` subcommands.

mod args;

pub use args::{CliArgs, Command, ServeArgs};

use clap::Parser;

/// Parse command-line arguments using clap
///
/// If parsing fails (or `--help` is given) clap prints the message and
/// exits the process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
