//! Consistency Policy
//!
//! Decides whether lookups and/or modifications must be served by the
//! primary. The router consults the policy on every call and never mutates it.
//!
//! - `primary_only`: strict-primary semantics for reads and writes
//! - `writes_to_primary`: local (possibly stale) reads, writes via the primary
//! - `unrestricted`: local reads, locally buffered writes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether an operation observes or modifies state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Read,
    Write,
}

/// Pluggable policy seam consumed by the router.
pub trait ReplicationPolicy: Send + Sync + fmt::Debug {
    /// Must lookups be served by the primary?
    fn lookup_requires_primary(&self) -> bool;

    /// Must modifications be served by the primary?
    fn modification_requires_primary(&self) -> bool;

    fn requires_primary(&self, mode: AccessMode) -> bool {
        match mode {
            AccessMode::Read => self.lookup_requires_primary(),
            AccessMode::Write => self.modification_requires_primary(),
        }
    }
}

/// Immutable two-knob policy value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsistencyPolicy {
    pub reads_require_primary: bool,
    pub writes_require_primary: bool,
}

impl ConsistencyPolicy {
    pub const fn new(reads_require_primary: bool, writes_require_primary: bool) -> Self {
        Self {
            reads_require_primary,
            writes_require_primary,
        }
    }

    /// Every operation is served by the primary.
    pub const fn primary_only() -> Self {
        Self::new(true, true)
    }

    /// Reads may be served locally, writes go through the primary.
    pub const fn writes_to_primary() -> Self {
        Self::new(false, true)
    }

    /// Everything may be served locally.
    pub const fn unrestricted() -> Self {
        Self::new(false, false)
    }

    /// Preset name, or `"custom"` for the one combination without a preset.
    pub fn name(&self) -> &'static str {
        match (self.reads_require_primary, self.writes_require_primary) {
            (true, true) => "primary_only",
            (false, true) => "writes_to_primary",
            (false, false) => "unrestricted",
            (true, false) => "custom",
        }
    }
}

impl Default for ConsistencyPolicy {
    /// Strict by default.
    fn default() -> Self {
        Self::primary_only()
    }
}

impl ReplicationPolicy for ConsistencyPolicy {
    fn lookup_requires_primary(&self) -> bool {
        self.reads_require_primary
    }

    fn modification_requires_primary(&self) -> bool {
        self.writes_require_primary
    }
}

impl fmt::Display for ConsistencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConsistencyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary_only" | "master_only" => Ok(Self::primary_only()),
            "writes_to_primary" => Ok(Self::writes_to_primary()),
            "unrestricted" => Ok(Self::unrestricted()),
            other => Err(format!(
                "unknown policy {:?}, expected primary_only, writes_to_primary or unrestricted",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let strict = ConsistencyPolicy::primary_only();
        assert!(strict.requires_primary(AccessMode::Read));
        assert!(strict.requires_primary(AccessMode::Write));

        let relaxed_reads = ConsistencyPolicy::writes_to_primary();
        assert!(!relaxed_reads.requires_primary(AccessMode::Read));
        assert!(relaxed_reads.requires_primary(AccessMode::Write));

        let open = ConsistencyPolicy::unrestricted();
        assert!(!open.requires_primary(AccessMode::Read));
        assert!(!open.requires_primary(AccessMode::Write));
    }

    #[test]
    fn test_default_is_strict() {
        assert_eq!(ConsistencyPolicy::default(), ConsistencyPolicy::primary_only());
    }

    #[test]
    fn test_parse_names() {
        for policy in [
            ConsistencyPolicy::primary_only(),
            ConsistencyPolicy::writes_to_primary(),
            ConsistencyPolicy::unrestricted(),
        ] {
            assert_eq!(policy.name().parse::<ConsistencyPolicy>(), Ok(policy));
        }
        assert!("eventual".parse::<ConsistencyPolicy>().is_err());
    }

    #[test]
    fn test_custom_combination_named() {
        assert_eq!(ConsistencyPolicy::new(true, false).name(), "custom");
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&ConsistencyPolicy::writes_to_primary()).unwrap();
        assert_eq!(
            json,
            r#"{"reads_require_primary":false,"writes_require_primary":true}"#
        );
    }
}
