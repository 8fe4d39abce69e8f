// growth-path-config/src/config.rs
// ============================================================================
// Module: Growth Path Configuration
// Description: Configuration loading and validation for the path engine.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: growth-path-core, growth-path-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Hosts describe engine defaults, storage tuning, and definition limits in a
//! TOML file. Every section has safe defaults; every provided value is
//! validated against hard bounds. Invalid configuration is an error, never a
//! silent fallback.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use growth_path_core::ActorClass;
use growth_path_core::EngineOptions;
use growth_path_core::PathSpec;
use growth_path_store_sqlite::SqliteJournalMode;
use growth_path_store_sqlite::SqliteStoreConfig;
use growth_path_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "growth-path.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "GROWTH_PATH_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Minimum allowed store busy timeout in milliseconds.
pub(crate) const MIN_BUSY_TIMEOUT_MS: u64 = 100;
/// Maximum allowed store busy timeout in milliseconds.
pub(crate) const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;
/// Default maximum number of stations accepted in one path.
pub(crate) const DEFAULT_MAX_STATIONS: usize = 64;
/// Hard cap on the configurable station limit.
pub(crate) const MAX_MAX_STATIONS: usize = 512;
/// Default maximum number of nodes in one unlock condition tree.
pub(crate) const DEFAULT_MAX_CONDITION_NODES: usize = 32;
/// Hard cap on the configurable condition-node limit.
pub(crate) const MAX_MAX_CONDITION_NODES: usize = 256;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config {path}: {reason}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Why the read failed.
        reason: String,
    },
    /// Config file exceeds the size limit.
    #[error("config file {path} exceeds {limit} bytes")]
    TooLarge {
        /// Config file path.
        path: PathBuf,
        /// Maximum accepted size.
        limit: usize,
    },
    /// Config file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// A config value is outside its accepted bounds.
    #[error("invalid config value: {0}")]
    Invalid(String),
    /// A path definition violates a configured limit.
    #[error("path definition exceeds limits: {0}")]
    LimitExceeded(String),
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Root configuration for the growth path engine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrowthPathConfig {
    /// Engine behavior defaults.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Durable storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Definition limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl GrowthPathConfig {
    /// Loads configuration from the given path, the `GROWTH_PATH_CONFIG`
    /// environment variable, or the default filename, in that order of
    /// preference. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable, oversized,
    /// unparsable, or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = path.map_or_else(
            || {
                env::var(CONFIG_ENV_VAR)
                    .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_NAME), PathBuf::from)
            },
            Path::to_path_buf,
        );

        if !resolved.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let metadata = fs::metadata(&resolved).map_err(|err| ConfigError::Read {
            path: resolved.clone(),
            reason: err.to_string(),
        })?;
        if usize::try_from(metadata.len()).unwrap_or(usize::MAX) > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::TooLarge {
                path: resolved,
                limit: MAX_CONFIG_FILE_SIZE,
            });
        }

        let contents = fs::read_to_string(&resolved).map_err(|err| ConfigError::Read {
            path: resolved.clone(),
            reason: err.to_string(),
        })?;
        let config: Self =
            toml::from_str(&contents).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section against its bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when any value is out of bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.storage.validate()?;
        self.limits.validate()?;
        Ok(())
    }
}

/// Engine behavior defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Default actor whitelist applied to stations without an explicit one.
    #[serde(default = "default_allowed_actors")]
    pub default_allowed_actors: String,
    /// Whether coaches are notified when a submission awaits approval.
    #[serde(default = "default_true")]
    pub notify_on_pending: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_allowed_actors: default_allowed_actors(),
            notify_on_pending: true,
        }
    }
}

impl EngineConfig {
    /// Validates the engine defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the actor whitelist does not
    /// parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_default_actors()?;
        Ok(())
    }

    /// Parses the default actor whitelist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a token is unrecognized.
    pub fn parsed_default_actors(&self) -> Result<Vec<ActorClass>, ConfigError> {
        ActorClass::parse_list(&self.default_allowed_actors)
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    /// Builds engine options from this section.
    #[must_use]
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            notify_on_pending: self.notify_on_pending,
        }
    }
}

/// Durable storage settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the `SQLite` database file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StorageConfig {
    /// Validates the storage settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the busy timeout is out of
    /// bounds or the path is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("storage.path must not be empty".to_string()));
        }
        if !(MIN_BUSY_TIMEOUT_MS..=MAX_BUSY_TIMEOUT_MS).contains(&self.busy_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "storage.busy_timeout_ms must be within {MIN_BUSY_TIMEOUT_MS}..={MAX_BUSY_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }

    /// Builds the store configuration from this section.
    #[must_use]
    pub fn store_config(&self) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path: self.path.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        }
    }
}

/// Limits applied to path definitions before processing.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum number of stations accepted in one path.
    #[serde(default = "default_max_stations")]
    pub max_stations: usize,
    /// Maximum number of nodes in one unlock condition tree.
    #[serde(default = "default_max_condition_nodes")]
    pub max_condition_nodes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_stations: default_max_stations(),
            max_condition_nodes: default_max_condition_nodes(),
        }
    }
}

impl LimitsConfig {
    /// Validates the limit bounds themselves.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a limit is zero or exceeds its
    /// hard cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stations == 0 || self.max_stations > MAX_MAX_STATIONS {
            return Err(ConfigError::Invalid(format!(
                "limits.max_stations must be within 1..={MAX_MAX_STATIONS}"
            )));
        }
        if self.max_condition_nodes == 0 || self.max_condition_nodes > MAX_MAX_CONDITION_NODES {
            return Err(ConfigError::Invalid(format!(
                "limits.max_condition_nodes must be within 1..={MAX_MAX_CONDITION_NODES}"
            )));
        }
        Ok(())
    }

    /// Checks a compiled path against these limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LimitExceeded`] when the path is too large.
    pub fn check_path(&self, spec: &PathSpec) -> Result<(), ConfigError> {
        if spec.stations.len() > self.max_stations {
            return Err(ConfigError::LimitExceeded(format!(
                "{} stations exceeds max_stations {}",
                spec.stations.len(),
                self.max_stations
            )));
        }
        for station in &spec.stations {
            let nodes = station.unlock_condition.complexity();
            if nodes > self.max_condition_nodes {
                return Err(ConfigError::LimitExceeded(format!(
                    "station {} condition has {nodes} nodes, exceeding max_condition_nodes {}",
                    station.node_id, self.max_condition_nodes
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Returns the default actor whitelist.
fn default_allowed_actors() -> String {
    "self".to_string()
}

/// Returns `true` (serde default helper).
const fn default_true() -> bool {
    true
}

/// Returns the default store path.
fn default_store_path() -> PathBuf {
    PathBuf::from("growth-path.db")
}

/// Returns the default busy timeout in milliseconds.
const fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Returns the default station limit.
const fn default_max_stations() -> usize {
    DEFAULT_MAX_STATIONS
}

/// Returns the default condition-node limit.
const fn default_max_condition_nodes() -> usize {
    DEFAULT_MAX_CONDITION_NODES
}
