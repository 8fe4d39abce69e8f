// growth-path-core/src/interfaces/mod.rs
// ============================================================================
// Module: Growth Path Interfaces
// Description: Backend-agnostic interfaces for flags, rewards, and storage.
// Purpose: Define the collaborator contracts used by the path engine runtime.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the path engine integrates with its host without
//! embedding backend-specific details: the flag store, the rewards ledger,
//! the per-user metadata substrate, coach assignments, progress storage, and
//! notification delivery. Implementations must be deterministic and fail
//! closed on missing or invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::BadgeSlug;
use crate::core::identifiers::FlagName;
use crate::core::identifiers::MissionId;
use crate::core::identifiers::NodeId;
use crate::core::identifiers::ScopeId;
use crate::core::identifiers::UserId;
use crate::core::records::CompletionRecord;
use crate::core::records::SubmissionRecord;
use crate::core::records::SubmissionStatus;

// ============================================================================
// SECTION: Flag Store
// ============================================================================

/// Flag store errors.
#[derive(Debug, Error)]
pub enum FlagStoreError {
    /// Flag store reported an error.
    #[error("flag store error: {0}")]
    Store(String),
}

/// Persisted per-user boolean facts.
///
/// Flags are monotonic: set once true, never auto-cleared.
pub trait FlagStore {
    /// Returns whether the user holds the named flag.
    ///
    /// # Errors
    ///
    /// Returns [`FlagStoreError`] when the lookup fails.
    fn has_flag(&self, user: UserId, flag: &FlagName) -> Result<bool, FlagStoreError>;

    /// Sets the named flag for the user. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`FlagStoreError`] when the write fails.
    fn set_flag(&self, user: UserId, flag: &FlagName) -> Result<(), FlagStoreError>;
}

// ============================================================================
// SECTION: Rewards Ledger
// ============================================================================

/// Rewards ledger errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Ledger backend is missing or uninitialized.
    #[error("rewards ledger unavailable: {0}")]
    Unavailable(String),
    /// Ledger reported an error.
    #[error("rewards ledger error: {0}")]
    Ledger(String),
}

/// Level information reported by the rewards ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    /// Display name of the level.
    pub name: String,
}

/// External points/badges/levels ledger.
///
/// The engine never computes reward formulas; it only dispatches grants and
/// reads back totals for condition evaluation.
pub trait RewardsLedger {
    /// Adds points to the user's balance with a human-readable reason.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when the grant fails.
    fn add_points(&self, user: UserId, amount: i64, reason: &str) -> Result<(), LedgerError>;

    /// Awards a named badge to the user.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when the grant fails.
    fn award_badge(&self, user: UserId, badge: &BadgeSlug) -> Result<(), LedgerError>;

    /// Returns whether the user owns the named badge.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when the lookup fails.
    fn has_badge(&self, user: UserId, badge: &BadgeSlug) -> Result<bool, LedgerError>;

    /// Returns the user's total points.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when the lookup fails.
    fn total_points(&self, user: UserId) -> Result<i64, LedgerError>;

    /// Returns the user's current level, if the ledger tracks levels.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when the lookup fails.
    fn level(&self, user: UserId) -> Result<Option<LevelInfo>, LedgerError>;
}

// ============================================================================
// SECTION: Metadata Store
// ============================================================================

/// Metadata store errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Metadata store reported an error.
    #[error("metadata store error: {0}")]
    Store(String),
}

/// Per-user key-value metadata substrate.
///
/// Backs the `user_meta_key` unlock predicate.
pub trait MetadataStore {
    /// Returns the metadata value stored under `key` for the user.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] when the lookup fails.
    fn get(&self, user: UserId, key: &str) -> Result<Option<String>, MetadataError>;
}

// ============================================================================
// SECTION: Coach Directory
// ============================================================================

/// Coach directory errors.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Directory backend is missing or uninitialized.
    #[error("coach directory unavailable: {0}")]
    Unavailable(String),
    /// Directory reported an error.
    #[error("coach directory error: {0}")]
    Directory(String),
}

/// Coach assignment and capability lookups.
///
/// Assignments are keyed by student and an optional scope (for example a
/// product purchase); admins hold a global capability that bypasses the actor
/// decision table.
pub trait CoachDirectory {
    /// Returns the coach assigned to the student, if any.
    ///
    /// A scoped lookup falls back to the global assignment when no scoped
    /// assignment exists.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the lookup fails.
    fn assigned_coach(
        &self,
        student: UserId,
        scope: Option<&ScopeId>,
    ) -> Result<Option<UserId>, DirectoryError>;

    /// Returns whether the user holds the global admin capability.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the lookup fails.
    fn is_admin(&self, user: UserId) -> Result<bool, DirectoryError>;
}

// ============================================================================
// SECTION: Progress Store
// ============================================================================

/// Progress store errors.
#[derive(Debug, Error)]
pub enum ProgressStoreError {
    /// Store I/O error.
    #[error("progress store io error: {0}")]
    Io(String),
    /// Store data is invalid.
    #[error("progress store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("progress store error: {0}")]
    Store(String),
}

/// Outcome of a completion insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionInsert {
    /// The record was written for the first time.
    Inserted,
    /// A record already existed for the `(user, station)` pair.
    AlreadyExists,
}

/// Durable storage for completion records and the submission audit trail.
///
/// Implementations must make [`ProgressStore::insert_completion`] atomic: two
/// concurrent writers for the same `(user, station)` pair must resolve to one
/// `Inserted` and one `AlreadyExists`, never two records and never a raw
/// conflict error.
pub trait ProgressStore {
    /// Inserts a completion record if none exists for its `(user, station)`
    /// pair.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressStoreError`] when the write fails for reasons other
    /// than an existing record.
    fn insert_completion(
        &self,
        record: &CompletionRecord,
    ) -> Result<CompletionInsert, ProgressStoreError>;

    /// Loads the completion record for a `(user, station)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressStoreError`] when the lookup fails.
    fn completion(
        &self,
        user: UserId,
        node: &NodeId,
    ) -> Result<Option<CompletionRecord>, ProgressStoreError>;

    /// Returns whether a completion record exists for a `(user, station)`
    /// pair.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressStoreError`] when the lookup fails.
    fn has_completion(&self, user: UserId, node: &NodeId) -> Result<bool, ProgressStoreError> {
        Ok(self.completion(user, node)?.is_some())
    }

    /// Appends a submission audit row.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressStoreError`] when the write fails.
    fn append_submission(&self, record: &SubmissionRecord) -> Result<(), ProgressStoreError>;

    /// Lists submission rows for a `(target user, mission)` pair in insertion
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressStoreError`] when the lookup fails.
    fn submissions(
        &self,
        target: UserId,
        mission: &MissionId,
    ) -> Result<Vec<SubmissionRecord>, ProgressStoreError>;

    /// Transitions every pending submission row for a `(target user,
    /// mission)` pair to the given status, returning how many rows changed.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressStoreError`] when the update fails.
    fn resolve_pending_submissions(
        &self,
        target: UserId,
        mission: &MissionId,
        status: SubmissionStatus,
    ) -> Result<u32, ProgressStoreError>;
}

// ============================================================================
// SECTION: Notification Dispatcher
// ============================================================================

/// Notification dispatch errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Dispatcher reported an error.
    #[error("notification dispatch error: {0}")]
    Dispatch(String),
}

/// Outbound notification delivery.
///
/// Used when a submission enters the pending-approval state. Delivery is
/// best-effort; failures never block the primary flow.
pub trait NotificationDispatcher {
    /// Delivers a notification to the user.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when delivery fails.
    fn notify(&self, user: UserId, title: &str, body: &str) -> Result<(), NotifyError>;
}

// ============================================================================
// SECTION: Completion Observer
// ============================================================================

/// Observer hook fired exactly once per recorded completion.
///
/// Lets subsystems such as notifications or reports react without the engine
/// depending on them.
pub trait CompletionObserver {
    /// Called after a completion record has been durably written.
    fn on_completion(&self, record: &CompletionRecord);
}
