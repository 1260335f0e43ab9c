//! Request Router
//!
//! Per call, decides whether the local replica or the current primary serves
//! an operation, and returns the same `AsyncResult` contract either way.
//!
//! - `target`: pure decision procedure over a role snapshot
//! - `routed`: the routed database surface
//! - `remote`: adapter from transport responses to `AsyncResult`
//! - `config`: JSON configuration

mod config;
mod errors;
mod remote;
mod routed;
mod target;

pub use config::{PolicySetting, RouterConfig};
pub use errors::{ConfigError, ErrorCode, RouterError, RouterResult};
pub use remote::{adapt, translate, RemoteExecutor};
pub use routed::{RouterCollaborators, RoutedDatabase};
pub use target::{plan_route, OperationKind, RoutePlan, Target};
