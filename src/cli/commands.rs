//! CLI command implementations
//!
//! Commands are offline: they read a configuration file and report, they
//! never contact a replica.

use std::net::SocketAddr;
use std::path::Path;

use serde_json::{json, Value};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};
use crate::policy::ReplicationPolicy;
use crate::role::ReplicaRoleSnapshot;
use crate::router::{plan_route, OperationKind, RoutePlan, RouterConfig};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
///
/// Failures are reported as an error envelope on stdout and returned.
pub fn run_command(cmd: Command) -> CliResult<()> {
    let outcome = match cmd {
        Command::CheckConfig { config } => check_config(&config),
        Command::Explain {
            config,
            primary,
            attached,
        } => explain(&config, primary.as_deref(), attached),
    };
    match outcome {
        Ok(data) => write_response(data),
        Err(err) => {
            write_error(err.code_str(), err.message())?;
            Err(err)
        }
    }
}

/// Load and validate a configuration file
pub fn check_config(config_path: &Path) -> CliResult<Value> {
    let config = RouterConfig::load(config_path)?;
    let policy = config.consistency_policy()?;
    Ok(json!({
        "database_name": config.database_name,
        "database_id": config.database_id,
        "policy": policy.name(),
        "reads_require_primary": policy.lookup_requires_primary(),
        "writes_require_primary": policy.modification_requires_primary(),
        "local_address": config.local_socket_address()?.to_string(),
        "notifier_thread_name": config.notifier_thread_name,
    }))
}

/// Report where every operation kind would be routed
pub fn explain(config_path: &Path, primary: Option<&str>, attached: bool) -> CliResult<Value> {
    let config = RouterConfig::load(config_path)?;
    let primary = primary
        .map(|p| {
            p.parse::<SocketAddr>().map_err(|e| {
                CliError::invalid_argument(format!("--primary '{}' is not a socket address: {}", p, e))
            })
        })
        .transpose()?;
    describe_routes(&config, primary, attached)
}

/// Routing table for `config` under a primary at `primary` (`None`: no quorum)
pub fn describe_routes(
    config: &RouterConfig,
    primary: Option<SocketAddr>,
    attached: bool,
) -> CliResult<Value> {
    let policy = config.consistency_policy()?;
    let local = config.local_socket_address()?;
    let snapshot = ReplicaRoleSnapshot {
        primary,
        self_is_primary: primary == Some(local),
    };

    let routes: Vec<Value> = OperationKind::ALL
        .iter()
        .map(|kind| {
            let plan = plan_route(&snapshot, &policy, kind.access_mode(), attached);
            json!({
                "operation": kind.as_str(),
                "route": route_label(*kind, plan),
            })
        })
        .collect();

    Ok(json!({
        "database_name": config.database_name,
        "policy": policy.name(),
        "role": snapshot.role().to_string(),
        "primary": primary.map(|p| p.to_string()),
        "routes": routes,
    }))
}

fn route_label(kind: OperationKind, plan: RoutePlan) -> String {
    match (kind, plan) {
        (_, RoutePlan::Unavailable) => plan.to_string(),
        (OperationKind::Insert, _) => "write path (persistence manager)".to_string(),
        (kind, RoutePlan::Remote(_)) if !kind.is_forwardable() => {
            "rejected (unsupported in routed mode)".to_string()
        }
        (_, plan) => plan.to_string(),
    }
}
