//! Observability for the router
//!
//! - Structured JSON logging with explicit severities
//! - Typed events
//! - Monotonic counters
//!
//! Observability is read-only: nothing here influences a routing decision.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, RouterMetrics};

/// Log an event at its own severity with fields
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // No panic for every severity class
        log_event(Event::RouteLocal, &[("database", "t")]);
        log_event(Event::PrimaryChanged, &[]);
        log_event(Event::RouteRejected, &[("code", "REPLICATION_UNAVAILABLE")]);
    }
}
