//! Shared role state
//!
//! Thread-safe holder the election subsystem writes and the router reads.

use std::net::SocketAddr;
use std::sync::{PoisonError, RwLock};

use super::{ReplicaRoleSnapshot, RoleOracle};
use crate::observability::{log_event, Event};

/// Primary address as last announced by the election subsystem
#[derive(Debug)]
pub struct SharedRoleState {
    local_address: SocketAddr,
    primary: RwLock<Option<SocketAddr>>,
}

impl SharedRoleState {
    /// New state for the node at `local_address`, without quorum.
    pub fn new(local_address: SocketAddr) -> Self {
        Self {
            local_address,
            primary: RwLock::new(None),
        }
    }

    /// New state with a known primary.
    pub fn with_primary(local_address: SocketAddr, primary: SocketAddr) -> Self {
        Self {
            local_address,
            primary: RwLock::new(Some(primary)),
        }
    }

    pub fn local_address(&self) -> SocketAddr {
        self.local_address
    }

    /// Announce a primary.
    pub fn set_primary(&self, primary: SocketAddr) {
        let previous = {
            let mut slot = self.primary.write().unwrap_or_else(PoisonError::into_inner);
            slot.replace(primary)
        };
        if previous != Some(primary) {
            let previous = previous.map(|p| p.to_string()).unwrap_or_default();
            log_event(
                Event::PrimaryChanged,
                &[
                    ("local", self.local_address.to_string().as_str()),
                    ("previous", previous.as_str()),
                    ("primary", primary.to_string().as_str()),
                ],
            );
        }
    }

    /// Quorum lost.
    pub fn clear_primary(&self) {
        let previous = {
            let mut slot = self.primary.write().unwrap_or_else(PoisonError::into_inner);
            slot.take()
        };
        if let Some(previous) = previous {
            log_event(
                Event::PrimaryLost,
                &[
                    ("local", self.local_address.to_string().as_str()),
                    ("previous", previous.to_string().as_str()),
                ],
            );
        }
    }
}

impl RoleOracle for SharedRoleState {
    fn current_primary(&self) -> Option<SocketAddr> {
        *self.primary.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_self(&self, address: &SocketAddr) -> bool {
        *address == self.local_address
    }

    fn snapshot(&self) -> ReplicaRoleSnapshot {
        let primary = self.current_primary();
        ReplicaRoleSnapshot {
            primary,
            self_is_primary: primary == Some(self.local_address),
        }
    }
}
