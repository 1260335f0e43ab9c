//! Configuration and CLI Tests
//!
//! - Config files load with defaults and are validated
//! - check-config and explain report from a file on disk

use std::fs;
use std::path::PathBuf;

use replica_router::cli::{check_config, explain, CliErrorCode};
use replica_router::{ConsistencyPolicy, RouterConfig};
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("replica-router.json");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_load_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "database_name": "accounts",
            "database_id": 3,
            "policy": "writes_to_primary",
            "local_address": "10.0.0.1:32222",
            "notifier_thread_name": "accounts-lsn"
        }"#,
    );

    let config = RouterConfig::load(&path).unwrap();
    assert_eq!(config.database_name, "accounts");
    assert_eq!(config.database_id, 3);
    assert_eq!(
        config.consistency_policy().unwrap(),
        ConsistencyPolicy::writes_to_primary()
    );
    assert_eq!(config.local_socket_address().unwrap().port(), 32222);
    assert_eq!(config.notifier_thread_name, "accounts-lsn");
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = RouterConfig::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().starts_with("Failed to read config"));
}

#[test]
fn test_check_config_reports_policy() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{"database_name": "accounts", "local_address": "10.0.0.1:32222"}"#,
    );

    let report = check_config(&path).unwrap();
    assert_eq!(report["policy"], "primary_only");
    assert_eq!(report["reads_require_primary"], true);
    assert_eq!(report["writes_require_primary"], true);
    assert_eq!(report["notifier_thread_name"], "lsn-notifier");
}

#[test]
fn test_check_config_accepts_explicit_flags() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "database_name": "accounts",
            "local_address": "10.0.0.1:32222",
            "policy": {"reads_require_primary": true, "writes_require_primary": false}
        }"#,
    );

    let report = check_config(&path).unwrap();
    assert_eq!(report["policy"], "custom");
    assert_eq!(report["reads_require_primary"], true);
    assert_eq!(report["writes_require_primary"], false);
}

#[test]
fn test_check_config_rejects_invalid() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"{"database_name": "", "local_address": "10.0.0.1:1"}"#);
    let err = check_config(&path).unwrap_err();
    assert_eq!(*err.code(), CliErrorCode::ConfigError);
}

#[test]
fn test_explain_replica_reads_local() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{"database_name": "accounts", "local_address": "10.0.0.1:32222", "policy": "writes_to_primary"}"#,
    );

    let table = explain(&path, Some("10.0.0.2:32222"), true).unwrap();
    assert_eq!(table["role"], "replica");
    let routes = table["routes"].as_array().unwrap();
    assert_eq!(routes.len(), 8);
    assert_eq!(routes[0]["operation"], "lookup");
    assert_eq!(routes[0]["route"], "local");
    assert_eq!(routes[7]["operation"], "insert");
    assert_eq!(routes[7]["route"], "write path (persistence manager)");
}

#[test]
fn test_explain_rejects_bad_primary() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{"database_name": "accounts", "local_address": "10.0.0.1:32222"}"#,
    );
    let err = explain(&path, Some("primary-host"), false).unwrap_err();
    assert_eq!(*err.code(), CliErrorCode::InvalidArgument);
}
