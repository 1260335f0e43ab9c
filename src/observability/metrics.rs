//! Router metrics
//!
//! Counters only, monotonic, relaxed atomics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::router::ErrorCode;

/// Operational counters for one router instance (or a shared set)
#[derive(Debug, Default)]
pub struct RouterMetrics {
    local_reads: AtomicU64,
    remote_reads: AtomicU64,
    rejected_requests: AtomicU64,
    unsupported_requests: AtomicU64,
    writes_dispatched: AtomicU64,
    local_attachments: AtomicU64,
    remote_no_such_database: AtomicU64,
    remote_no_such_index: AtomicU64,
    remote_replication_failures: AtomicU64,
    waiters_fired: AtomicU64,
    waiters_cancelled: AtomicU64,
    lsn_regressions: AtomicU64,
}

/// Point-in-time copy of every counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub local_reads: u64,
    pub remote_reads: u64,
    pub rejected_requests: u64,
    pub unsupported_requests: u64,
    pub writes_dispatched: u64,
    pub local_attachments: u64,
    pub remote_no_such_database: u64,
    pub remote_no_such_index: u64,
    pub remote_replication_failures: u64,
    pub waiters_fired: u64,
    pub waiters_cancelled: u64,
    pub lsn_regressions: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl RouterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_local_reads(&self) {
        bump(&self.local_reads);
    }

    pub fn increment_remote_reads(&self) {
        bump(&self.remote_reads);
    }

    pub fn increment_rejected(&self) {
        bump(&self.rejected_requests);
    }

    pub fn increment_unsupported(&self) {
        bump(&self.unsupported_requests);
    }

    pub fn increment_writes(&self) {
        bump(&self.writes_dispatched);
    }

    pub fn increment_local_attachments(&self) {
        bump(&self.local_attachments);
    }

    /// Count a failed remote call by its translated code.
    pub fn record_remote_failure(&self, code: ErrorCode) {
        match code {
            ErrorCode::NoSuchDatabase => bump(&self.remote_no_such_database),
            ErrorCode::NoSuchIndex => bump(&self.remote_no_such_index),
            _ => bump(&self.remote_replication_failures),
        }
    }

    pub fn add_waiters_fired(&self, count: u64) {
        self.waiters_fired.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_waiters_cancelled(&self) {
        bump(&self.waiters_cancelled);
    }

    pub fn increment_lsn_regressions(&self) {
        bump(&self.lsn_regressions);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            local_reads: load(&self.local_reads),
            remote_reads: load(&self.remote_reads),
            rejected_requests: load(&self.rejected_requests),
            unsupported_requests: load(&self.unsupported_requests),
            writes_dispatched: load(&self.writes_dispatched),
            local_attachments: load(&self.local_attachments),
            remote_no_such_database: load(&self.remote_no_such_database),
            remote_no_such_index: load(&self.remote_no_such_index),
            remote_replication_failures: load(&self.remote_replication_failures),
            waiters_fired: load(&self.waiters_fired),
            waiters_cancelled: load(&self.waiters_cancelled),
            lsn_regressions: load(&self.lsn_regressions),
        }
    }

    /// Current counters as a JSON object.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}
