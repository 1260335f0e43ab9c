//! Target resolution
//!
//! `plan_route` is the whole decision procedure as a pure function over one
//! role snapshot. The router feeds it a fresh snapshot on every call.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::engine::LocalDatabase;
use crate::policy::{AccessMode, ReplicationPolicy};
use crate::role::ReplicaRoleSnapshot;

/// Every operation the routed database exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Lookup,
    PrefixLookup,
    ReversePrefixLookup,
    RangeLookup,
    ReverseRangeLookup,
    UserDefinedLookup,
    Comparators,
    Insert,
}

impl OperationKind {
    pub const ALL: [OperationKind; 8] = [
        OperationKind::Lookup,
        OperationKind::PrefixLookup,
        OperationKind::ReversePrefixLookup,
        OperationKind::RangeLookup,
        OperationKind::ReverseRangeLookup,
        OperationKind::UserDefinedLookup,
        OperationKind::Comparators,
        OperationKind::Insert,
    ];

    pub fn access_mode(&self) -> AccessMode {
        match self {
            OperationKind::Insert => AccessMode::Write,
            _ => AccessMode::Read,
        }
    }

    /// Whether the operation can be expressed as a remote request.
    pub fn is_forwardable(&self) -> bool {
        !matches!(
            self,
            OperationKind::UserDefinedLookup | OperationKind::Comparators
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Lookup => "lookup",
            OperationKind::PrefixLookup => "prefix_lookup",
            OperationKind::ReversePrefixLookup => "reverse_prefix_lookup",
            OperationKind::RangeLookup => "range_lookup",
            OperationKind::ReverseRangeLookup => "reverse_range_lookup",
            OperationKind::UserDefinedLookup => "user_defined_lookup",
            OperationKind::Comparators => "comparators",
            OperationKind::Insert => "insert",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where one call executes
#[derive(Clone)]
pub enum Target {
    Local(Arc<dyn LocalDatabase>),
    Remote(SocketAddr),
}

impl Target {
    pub fn is_local(&self) -> bool {
        matches!(self, Target::Local(_))
    }

    pub fn remote_address(&self) -> Option<SocketAddr> {
        match self {
            Target::Remote(address) => Some(*address),
            Target::Local(_) => None,
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Local(db) => f.debug_tuple("Local").field(&db.name()).finish(),
            Target::Remote(address) => f.debug_tuple("Remote").field(address).finish(),
        }
    }
}

/// Outcome of the decision procedure, before any handle is acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePlan {
    /// Serve with the attached local handle
    Local,
    /// Acquire the local handle, then serve locally
    AttachThenLocal,
    /// Forward to the primary at this address
    Remote(SocketAddr),
    /// No primary known
    Unavailable,
}

impl fmt::Display for RoutePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePlan::Local => f.write_str("local"),
            RoutePlan::AttachThenLocal => f.write_str("local (attach on first use)"),
            RoutePlan::Remote(address) => write!(f, "remote {}", address),
            RoutePlan::Unavailable => f.write_str("rejected (replication unavailable)"),
        }
    }
}

/// Decide where an operation of `mode` runs.
///
/// Local execution is allowed when this node is the primary or the policy
/// does not restrict `mode` to the primary. A missing local handle is only
/// acquired when this node is the primary or modifications are unrestricted;
/// otherwise the call goes to the primary.
pub fn plan_route(
    snapshot: &ReplicaRoleSnapshot,
    policy: &dyn ReplicationPolicy,
    mode: AccessMode,
    local_attached: bool,
) -> RoutePlan {
    let primary = match snapshot.primary {
        Some(primary) => primary,
        None => return RoutePlan::Unavailable,
    };
    let is_primary = snapshot.self_is_primary;

    if !is_primary && policy.requires_primary(mode) {
        return RoutePlan::Remote(primary);
    }
    if local_attached {
        return RoutePlan::Local;
    }
    if is_primary || !policy.modification_requires_primary() {
        RoutePlan::AttachThenLocal
    } else {
        RoutePlan::Remote(primary)
    }
}
