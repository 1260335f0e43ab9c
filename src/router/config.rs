//! Router configuration
//!
//! Loaded from a single JSON file:
//!
//! ```json
//! {
//!   "database_name": "accounts",
//!   "database_id": 3,
//!   "policy": "writes_to_primary",
//!   "local_address": "10.0.0.1:32222"
//! }
//! ```
//!
//! `policy` is either a preset name or the two flags spelled out:
//! `{"reads_require_primary": true, "writes_require_primary": false}`.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use crate::lsn::{Lsn, LsnResult, LsnWaitList};
use crate::policy::ConsistencyPolicy;

/// Configuration of one routed database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Name of the database on every replica (required)
    pub database_name: String,

    /// Numeric id used in insert groups (default 0)
    #[serde(default)]
    pub database_id: u32,

    /// Policy preset name or explicit flags (default "primary_only")
    #[serde(default = "default_policy")]
    pub policy: PolicySetting,

    /// Replication address of this node (required)
    pub local_address: String,

    /// Name of the LSN notifier thread (default "lsn-notifier")
    #[serde(default = "default_notifier_thread_name")]
    pub notifier_thread_name: String,
}

/// Consistency policy as written in a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicySetting {
    Preset(String),
    Flags(ConsistencyPolicy),
}

impl PolicySetting {
    pub fn resolve(&self) -> Result<ConsistencyPolicy, ConfigError> {
        match self {
            PolicySetting::Preset(name) => name.parse().map_err(ConfigError::Invalid),
            PolicySetting::Flags(policy) => Ok(*policy),
        }
    }
}

impl From<ConsistencyPolicy> for PolicySetting {
    /// Preset name when one exists, explicit flags otherwise.
    fn from(policy: ConsistencyPolicy) -> Self {
        match policy.name() {
            "custom" => PolicySetting::Flags(policy),
            name => PolicySetting::Preset(name.to_string()),
        }
    }
}

fn default_policy() -> PolicySetting {
    PolicySetting::Preset("primary_only".to_string())
}

fn default_notifier_thread_name() -> String {
    "lsn-notifier".to_string()
}

impl RouterConfig {
    pub fn new(database_name: impl Into<String>, local_address: SocketAddr) -> Self {
        Self {
            database_name: database_name.into(),
            database_id: 0,
            policy: default_policy(),
            local_address: local_address.to_string(),
            notifier_thread_name: default_notifier_thread_name(),
        }
    }

    /// Load and validate configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Parse and validate configuration from a JSON document
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: RouterConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_name.trim().is_empty() {
            return Err(ConfigError::Invalid("database_name must not be empty".into()));
        }
        if self.notifier_thread_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "notifier_thread_name must not be empty".into(),
            ));
        }
        self.consistency_policy()?;
        self.local_socket_address()?;
        Ok(())
    }

    pub fn consistency_policy(&self) -> Result<ConsistencyPolicy, ConfigError> {
        self.policy.resolve()
    }

    pub fn local_socket_address(&self) -> Result<SocketAddr, ConfigError> {
        self.local_address.parse().map_err(|e| {
            ConfigError::Invalid(format!(
                "local_address '{}' is not a socket address: {}",
                self.local_address, e
            ))
        })
    }

    /// LSN wait-list whose notifier thread carries the configured name.
    pub fn wait_list(&self, initial: Lsn) -> LsnResult<LsnWaitList> {
        LsnWaitList::with_thread_name(initial, &self.notifier_thread_name)
    }

    pub fn with_policy(mut self, policy: ConsistencyPolicy) -> Self {
        self.policy = policy.into();
        self
    }

    pub fn with_database_id(mut self, database_id: u32) -> Self {
        self.database_id = database_id;
        self
    }
}
