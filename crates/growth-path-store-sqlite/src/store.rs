// growth-path-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Progress Store
// Description: Durable ProgressStore/FlagStore/MetadataStore backed by SQLite.
// Purpose: Persist progress state with storage-level completion idempotency.
// Dependencies: growth-path-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements the engine's storage interfaces on a single
//! `SQLite` database. The `completions` table declares a primary key over
//! `(user_id, node_id)` and inserts with `ON CONFLICT DO NOTHING`, so the
//! at-most-once completion guarantee holds at the storage layer: of two
//! concurrent writers, exactly one observes an insert and the other observes
//! the existing record, never a raw conflict error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use growth_path_core::CompletionInsert;
use growth_path_core::CompletionRecord;
use growth_path_core::FlagName;
use growth_path_core::FlagStore;
use growth_path_core::FlagStoreError;
use growth_path_core::MetadataError;
use growth_path_core::MetadataStore;
use growth_path_core::MissionId;
use growth_path_core::MissionKind;
use growth_path_core::NodeId;
use growth_path_core::ProgressStore;
use growth_path_core::ProgressStoreError;
use growth_path_core::SubmissionRecord;
use growth_path_core::SubmissionStatus;
use growth_path_core::Timestamp;
use growth_path_core::UserId;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Schema statements applied on open.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS completions (
    user_id            INTEGER NOT NULL,
    node_id            TEXT    NOT NULL,
    completed_at       INTEGER NOT NULL,
    completed_by_coach INTEGER NOT NULL,
    mission_kind       TEXT    NOT NULL,
    PRIMARY KEY (user_id, node_id)
);
CREATE TABLE IF NOT EXISTS submissions (
    seq            INTEGER PRIMARY KEY AUTOINCREMENT,
    target_user_id INTEGER NOT NULL,
    actor_user_id  INTEGER NOT NULL,
    actor_ip       TEXT,
    mission_kind   TEXT    NOT NULL,
    mission_id     TEXT    NOT NULL,
    payload        TEXT,
    status         TEXT    NOT NULL,
    submitted_at   INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS submissions_by_mission
    ON submissions (target_user_id, mission_id);
CREATE TABLE IF NOT EXISTS flags (
    user_id INTEGER NOT NULL,
    flag    TEXT    NOT NULL,
    PRIMARY KEY (user_id, flag)
);
CREATE TABLE IF NOT EXISTS user_meta (
    user_id    INTEGER NOT NULL,
    meta_key   TEXT    NOT NULL,
    meta_value TEXT    NOT NULL,
    PRIMARY KEY (user_id, meta_key)
);
";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` progress store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
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

impl SqliteStoreConfig {
    /// Creates a config for the given database path with default tuning.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout in milliseconds.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Database could not be opened.
    #[error("failed to open sqlite store at {path}: {source}")]
    Open {
        /// Database path.
        path: PathBuf,
        /// Underlying `SQLite` error.
        source: rusqlite::Error,
    },
    /// `SQLite` reported an error.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    /// Connection lock is poisoned.
    #[error("sqlite store mutex poisoned")]
    Poisoned,
    /// Stored data does not round-trip into domain types.
    #[error("sqlite store invalid data: {0}")]
    InvalidData(String),
}

impl From<SqliteStoreError> for ProgressStoreError {
    fn from(err: SqliteStoreError) -> Self {
        match err {
            SqliteStoreError::InvalidData(msg) => Self::Invalid(msg),
            other => Self::Io(other.to_string()),
        }
    }
}

impl From<SqliteStoreError> for FlagStoreError {
    fn from(err: SqliteStoreError) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<SqliteStoreError> for MetadataError {
    fn from(err: SqliteStoreError) -> Self {
        Self::Store(err.to_string())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Durable progress/flag/metadata store backed by one `SQLite` database.
#[derive(Clone)]
pub struct SqliteProgressStore {
    /// Shared connection protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteProgressStore {
    /// Opens (and initializes) the store described by the config.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or the
    /// schema cannot be applied.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        let conn = Connection::open_with_flags(
            &config.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|source| SqliteStoreError::Open {
            path: config.path.clone(),
            source,
        })?;
        Self::initialize(conn, config)
    }

    /// Opens an in-memory store for tests and demos.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn, &SqliteStoreConfig::new(Path::new(":memory:")))
    }

    /// Applies pragmas and the schema to a fresh connection.
    fn initialize(
        conn: Connection,
        config: &SqliteStoreConfig,
    ) -> Result<Self, SqliteStoreError> {
        conn.busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))?;
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = {};",
            config.journal_mode.pragma_value()
        ))?;
        conn.execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.conn.lock().map_err(|_| SqliteStoreError::Poisoned)
    }

    /// Stores a per-user metadata value (host write surface).
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] when the write fails.
    pub fn set_metadata(
        &self,
        user: UserId,
        key: &str,
        value: &str,
    ) -> Result<(), MetadataError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO user_meta (user_id, meta_key, meta_value) VALUES (?1, ?2, ?3) \
                 ON CONFLICT (user_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value",
                params![user_to_sql(user).map_err(MetadataError::from)?, key, value],
            )
            .map_err(|err| MetadataError::Store(err.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Converts a user identifier into its storable form.
fn user_to_sql(user: UserId) -> Result<i64, SqliteStoreError> {
    i64::try_from(user.value())
        .map_err(|_| SqliteStoreError::InvalidData(format!("user id out of range: {user}")))
}

/// Converts a stored user identifier back into the domain type.
fn user_from_sql(value: i64) -> Result<UserId, SqliteStoreError> {
    u64::try_from(value)
        .map(UserId::new)
        .map_err(|_| SqliteStoreError::InvalidData(format!("negative user id in store: {value}")))
}

/// Returns the stable string form of a submission status.
const fn status_to_sql(status: SubmissionStatus) -> &'static str {
    match status {
        SubmissionStatus::Pending => "pending",
        SubmissionStatus::Completed => "completed",
        SubmissionStatus::Rejected => "rejected",
    }
}

/// Parses a stored submission status.
fn status_from_sql(value: &str) -> Result<SubmissionStatus, SqliteStoreError> {
    match value {
        "pending" => Ok(SubmissionStatus::Pending),
        "completed" => Ok(SubmissionStatus::Completed),
        "rejected" => Ok(SubmissionStatus::Rejected),
        other => {
            Err(SqliteStoreError::InvalidData(format!("unknown submission status: {other:?}")))
        }
    }
}

/// Serializes an optional payload to its stored form.
fn payload_to_sql(payload: Option<&serde_json::Value>) -> Result<Option<String>, SqliteStoreError> {
    payload
        .map(|value| {
            serde_json::to_string(value).map_err(|err| SqliteStoreError::InvalidData(err.to_string()))
        })
        .transpose()
}

/// Parses a stored payload back into JSON.
fn payload_from_sql(value: Option<String>) -> Result<Option<serde_json::Value>, SqliteStoreError> {
    value
        .map(|text| {
            serde_json::from_str(&text).map_err(|err| SqliteStoreError::InvalidData(err.to_string()))
        })
        .transpose()
}

// ============================================================================
// SECTION: ProgressStore Implementation
// ============================================================================

impl ProgressStore for SqliteProgressStore {
    fn insert_completion(
        &self,
        record: &CompletionRecord,
    ) -> Result<CompletionInsert, ProgressStoreError> {
        let guard = self.lock()?;
        let changed = guard
            .execute(
                "INSERT INTO completions \
                 (user_id, node_id, completed_at, completed_by_coach, mission_kind) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT (user_id, node_id) DO NOTHING",
                params![
                    user_to_sql(record.user_id)?,
                    record.node_id.as_str(),
                    record.completed_at.as_unix_millis(),
                    record.completed_by_coach,
                    record.mission_kind.as_str(),
                ],
            )
            .map_err(|err| ProgressStoreError::Io(err.to_string()))?;
        if changed == 0 {
            Ok(CompletionInsert::AlreadyExists)
        } else {
            Ok(CompletionInsert::Inserted)
        }
    }

    fn completion(
        &self,
        user: UserId,
        node: &NodeId,
    ) -> Result<Option<CompletionRecord>, ProgressStoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT user_id, node_id, completed_at, completed_by_coach, mission_kind \
                 FROM completions WHERE user_id = ?1 AND node_id = ?2",
                params![user_to_sql(user)?, node.as_str()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, bool>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(|err| ProgressStoreError::Io(err.to_string()))?;

        row.map(|(user_id, node_id, completed_at, completed_by_coach, mission_kind)| {
            Ok::<CompletionRecord, SqliteStoreError>(CompletionRecord {
                user_id: user_from_sql(user_id)?,
                node_id: NodeId::from(node_id),
                completed_at: Timestamp::from_unix_millis(completed_at),
                completed_by_coach,
                mission_kind: MissionKind::from(mission_kind),
            })
        })
        .transpose()
        .map_err(ProgressStoreError::from)
    }

    fn append_submission(&self, record: &SubmissionRecord) -> Result<(), ProgressStoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO submissions \
                 (target_user_id, actor_user_id, actor_ip, mission_kind, mission_id, payload, \
                  status, submitted_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user_to_sql(record.target_user_id)?,
                    user_to_sql(record.actor_user_id)?,
                    record.actor_ip.as_deref(),
                    record.mission_kind.as_str(),
                    record.mission_id.as_str(),
                    payload_to_sql(record.payload.as_ref())?,
                    status_to_sql(record.status),
                    record.submitted_at.as_unix_millis(),
                ],
            )
            .map_err(|err| ProgressStoreError::Io(err.to_string()))?;
        Ok(())
    }

    fn submissions(
        &self,
        target: UserId,
        mission: &MissionId,
    ) -> Result<Vec<SubmissionRecord>, ProgressStoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT target_user_id, actor_user_id, actor_ip, mission_kind, mission_id, \
                        payload, status, submitted_at \
                 FROM submissions WHERE target_user_id = ?1 AND mission_id = ?2 ORDER BY seq",
            )
            .map_err(|err| ProgressStoreError::Io(err.to_string()))?;

        let rows = statement
            .query_map(params![user_to_sql(target)?, mission.as_str()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, i64>(7)?,
                ))
            })
            .map_err(|err| ProgressStoreError::Io(err.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let (target_id, actor_id, actor_ip, kind, mission_id, payload, status, submitted_at) =
                row.map_err(|err| ProgressStoreError::Io(err.to_string()))?;
            records.push(SubmissionRecord {
                target_user_id: user_from_sql(target_id)?,
                actor_user_id: user_from_sql(actor_id)?,
                actor_ip,
                mission_kind: MissionKind::from(kind),
                mission_id: MissionId::from(mission_id),
                payload: payload_from_sql(payload)?,
                status: status_from_sql(&status)?,
                submitted_at: Timestamp::from_unix_millis(submitted_at),
            });
        }
        Ok(records)
    }

    fn resolve_pending_submissions(
        &self,
        target: UserId,
        mission: &MissionId,
        status: SubmissionStatus,
    ) -> Result<u32, ProgressStoreError> {
        let guard = self.lock()?;
        let changed = guard
            .execute(
                "UPDATE submissions SET status = ?1 \
                 WHERE target_user_id = ?2 AND mission_id = ?3 AND status = 'pending'",
                params![status_to_sql(status), user_to_sql(target)?, mission.as_str()],
            )
            .map_err(|err| ProgressStoreError::Io(err.to_string()))?;
        Ok(u32::try_from(changed).unwrap_or(u32::MAX))
    }
}

// ============================================================================
// SECTION: FlagStore Implementation
// ============================================================================

impl FlagStore for SqliteProgressStore {
    fn has_flag(&self, user: UserId, flag: &FlagName) -> Result<bool, FlagStoreError> {
        let guard = self.lock()?;
        let found = guard
            .query_row(
                "SELECT 1 FROM flags WHERE user_id = ?1 AND flag = ?2",
                params![user_to_sql(user).map_err(FlagStoreError::from)?, flag.as_str()],
                |_| Ok(()),
            )
            .optional()
            .map_err(|err| FlagStoreError::Store(err.to_string()))?;
        Ok(found.is_some())
    }

    fn set_flag(&self, user: UserId, flag: &FlagName) -> Result<(), FlagStoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO flags (user_id, flag) VALUES (?1, ?2) \
                 ON CONFLICT (user_id, flag) DO NOTHING",
                params![user_to_sql(user).map_err(FlagStoreError::from)?, flag.as_str()],
            )
            .map_err(|err| FlagStoreError::Store(err.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: MetadataStore Implementation
// ============================================================================

impl MetadataStore for SqliteProgressStore {
    fn get(&self, user: UserId, key: &str) -> Result<Option<String>, MetadataError> {
        let guard = self.lock()?;
        guard
            .query_row(
                "SELECT meta_value FROM user_meta WHERE user_id = ?1 AND meta_key = ?2",
                params![user_to_sql(user).map_err(MetadataError::from)?, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| MetadataError::Store(err.to_string()))
    }
}
