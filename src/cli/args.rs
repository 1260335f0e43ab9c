//! CLI argument definitions using clap
//!
//! Commands:
//! - replica-router check-config --config <path>
//! - replica-router explain --config <path> [--primary <addr>] [--attached]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// replica-router - inspect how requests to a replicated database are routed
#[derive(Parser, Debug)]
#[command(name = "replica-router")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a router configuration file
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./replica-router.json")]
        config: PathBuf,
    },

    /// Show where every operation would be routed
    Explain {
        /// Path to configuration file
        #[arg(long, default_value = "./replica-router.json")]
        config: PathBuf,

        /// Address of the current primary; omit to simulate lost quorum
        #[arg(long)]
        primary: Option<String>,

        /// Assume the local database handle is already attached
        #[arg(long)]
        attached: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_explain() {
        let cli = Cli::try_parse_from([
            "replica-router",
            "explain",
            "--config",
            "r.json",
            "--primary",
            "10.0.0.2:32222",
        ])
        .unwrap();
        match cli.command {
            Command::Explain {
                config,
                primary,
                attached,
            } => {
                assert_eq!(config, PathBuf::from("r.json"));
                assert_eq!(primary.as_deref(), Some("10.0.0.2:32222"));
                assert!(!attached);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_check_config_default_path() {
        let cli = Cli::try_parse_from(["replica-router", "check-config"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::CheckConfig { config } if config == PathBuf::from("./replica-router.json")
        ));
    }
}
