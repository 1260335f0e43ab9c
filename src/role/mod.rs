//! Replica Role Oracle
//!
//! The election subsystem owns who the primary is. The router only asks,
//! and treats every answer as a fresh snapshot:
//! - No primary known: quorum lost, nothing may be served
//! - Primary is this node: everything may be served locally
//! - Primary is another node: the policy decides

mod shared;

use std::fmt;
use std::net::SocketAddr;

pub use shared::SharedRoleState;

/// Read accessor onto externally owned role state.
pub trait RoleOracle: Send + Sync {
    /// Address of the current primary, `None` without quorum.
    fn current_primary(&self) -> Option<SocketAddr>;

    /// Whether `address` designates this node.
    fn is_self(&self, address: &SocketAddr) -> bool;

    /// Read primary and self-identity once.
    fn snapshot(&self) -> ReplicaRoleSnapshot {
        let primary = self.current_primary();
        let self_is_primary = primary.map(|addr| self.is_self(&addr)).unwrap_or(false);
        ReplicaRoleSnapshot {
            primary,
            self_is_primary,
        }
    }
}

/// Role of this node as seen in one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaRole {
    Primary,
    Replica,
    NoQuorum,
}

impl fmt::Display for ReplicaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReplicaRole::Primary => "primary",
            ReplicaRole::Replica => "replica",
            ReplicaRole::NoQuorum => "no_quorum",
        })
    }
}

/// Point-in-time read of role state. May be stale a moment later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaRoleSnapshot {
    pub primary: Option<SocketAddr>,
    pub self_is_primary: bool,
}

impl ReplicaRoleSnapshot {
    pub fn no_quorum() -> Self {
        Self {
            primary: None,
            self_is_primary: false,
        }
    }

    pub fn role(&self) -> ReplicaRole {
        match (self.primary, self.self_is_primary) {
            (None, _) => ReplicaRole::NoQuorum,
            (Some(_), true) => ReplicaRole::Primary,
            (Some(_), false) => ReplicaRole::Replica,
        }
    }
}
