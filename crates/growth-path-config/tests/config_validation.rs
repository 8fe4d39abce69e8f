// growth-path-config/tests/config_validation.rs
// ============================================================================
// Module: Config Validation Tests
// Description: Validate fail-closed handling of invalid configuration.
// ============================================================================
//! ## Overview
//! Exercises bound checks, unknown-field rejection, and path-definition
//! limit enforcement.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;

use growth_path_config::ConfigError;
use growth_path_config::GrowthPathConfig;
use growth_path_config::LimitsConfig;
use growth_path_core::PathConfig;
use growth_path_core::PathSpec;
use growth_path_core::StationConfig;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads a config from literal TOML contents.
fn load(contents: &str) -> Result<GrowthPathConfig, ConfigError> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("growth-path.toml");
    fs::write(&path, contents).unwrap();
    GrowthPathConfig::load(Some(&path))
}

// ============================================================================
// SECTION: Bound Checks
// ============================================================================

#[test]
fn test_unknown_fields_are_rejected() {
    let err = load("[engine]\nallow_everything = true\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_invalid_actor_whitelist_is_rejected() {
    let err = load("[engine]\ndefault_allowed_actors = \"self,wizards\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_busy_timeout_bounds() {
    let err = load("[storage]\nbusy_timeout_ms = 10\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = load("[storage]\nbusy_timeout_ms = 600000\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_empty_storage_path_is_rejected() {
    let err = load("[storage]\npath = \"\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_limit_bounds() {
    let err = load("[limits]\nmax_stations = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = load("[limits]\nmax_stations = 100000\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = load("[limits]\nmax_condition_nodes = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

// ============================================================================
// SECTION: Path Limits
// ============================================================================

#[test]
fn test_station_count_limit_is_enforced() {
    let limits = LimitsConfig {
        max_stations: 2,
        max_condition_nodes: 8,
    };

    let small = PathSpec::compile(&PathConfig {
        stations: vec![StationConfig::default(), StationConfig::default()],
        ..PathConfig::default()
    })
    .unwrap();
    limits.check_path(&small).unwrap();

    let large = PathSpec::compile(&PathConfig {
        stations: vec![
            StationConfig::default(),
            StationConfig::default(),
            StationConfig::default(),
        ],
        ..PathConfig::default()
    })
    .unwrap();
    let err = limits.check_path(&large).unwrap_err();
    assert!(matches!(err, ConfigError::LimitExceeded(_)));
}

#[test]
fn test_condition_node_limit_is_enforced() {
    let limits = LimitsConfig {
        max_stations: 16,
        max_condition_nodes: 3,
    };

    let spec = PathSpec::compile(&PathConfig {
        stations: vec![StationConfig {
            unlock_condition: "has_flag:a|has_flag:b|has_flag:c|has_flag:d".to_string(),
            ..StationConfig::default()
        }],
        ..PathConfig::default()
    })
    .unwrap();

    let err = limits.check_path(&spec).unwrap_err();
    assert!(matches!(err, ConfigError::LimitExceeded(_)));
}
