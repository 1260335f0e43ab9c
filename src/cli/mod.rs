//! CLI module for replica-router
//!
//! Provides command-line interface for:
//! - check-config: Validate a router configuration file
//! - explain: Print the routing table for a given primary

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_config, describe_routes, explain, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
