//! Observable router events

use std::fmt;

use super::logger::Severity;

/// Events emitted by the router, the role state and the LSN wait-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Routing decisions
    /// Read served by the local replica
    RouteLocal,
    /// Read forwarded to the primary
    RouteRemote,
    /// Request failed before dispatch
    RouteRejected,
    /// Operation cannot be forwarded
    RouteUnsupported,
    /// Insert group handed to the persistence manager
    WriteDispatched,
    /// Local database handle attached on demand
    LocalAttached,
    /// Remote call failed, translated error delivered
    RemoteFailed,
    /// A result listener panicked
    ListenerPanicked,

    // Replication progress
    /// Latest applied LSN moved forward
    LsnAdvanced,
    /// Latest applied LSN was asked to move backwards (FATAL)
    LsnRegression,
    /// A waiter was cancelled before firing
    WaiterCancelled,
    /// A waiter callback panicked
    WaiterPanicked,

    // Role
    /// Primary address changed
    PrimaryChanged,
    /// Quorum lost, no primary known
    PrimaryLost,

    // Lifecycle
    /// Routed database shut down
    Shutdown,
}

impl Event {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::RouteLocal => "ROUTE_LOCAL",
            Event::RouteRemote => "ROUTE_REMOTE",
            Event::RouteRejected => "ROUTE_REJECTED",
            Event::RouteUnsupported => "ROUTE_UNSUPPORTED",
            Event::WriteDispatched => "WRITE_DISPATCHED",
            Event::LocalAttached => "LOCAL_ATTACHED",
            Event::RemoteFailed => "REMOTE_FAILED",
            Event::ListenerPanicked => "LISTENER_PANICKED",
            Event::LsnAdvanced => "LSN_ADVANCED",
            Event::LsnRegression => "LSN_REGRESSION",
            Event::WaiterCancelled => "WAITER_CANCELLED",
            Event::WaiterPanicked => "WAITER_PANICKED",
            Event::PrimaryChanged => "PRIMARY_CHANGED",
            Event::PrimaryLost => "PRIMARY_LOST",
            Event::Shutdown => "SHUTDOWN",
        }
    }

    /// Severity the event is logged at.
    pub fn severity(&self) -> Severity {
        match self {
            Event::RouteLocal
            | Event::RouteRemote
            | Event::WriteDispatched
            | Event::LsnAdvanced
            | Event::WaiterCancelled => Severity::Trace,
            Event::LocalAttached | Event::PrimaryChanged | Event::Shutdown => Severity::Info,
            Event::RouteRejected | Event::RouteUnsupported | Event::PrimaryLost => Severity::Warn,
            Event::RemoteFailed | Event::ListenerPanicked | Event::WaiterPanicked => {
                Severity::Error
            }
            Event::LsnRegression => Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
