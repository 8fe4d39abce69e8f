// growth-path-core/src/runtime/store.rs
// ============================================================================
// Module: Growth Path In-Memory Collaborators
// Description: In-memory collaborator implementations for tests and demos.
// Purpose: Provide deterministic implementations without external deps.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! This module provides simple in-memory implementations of every
//! collaborator interface for tests and local demos. They are not intended
//! for production use, but the progress store honors the same atomic
//! check-then-insert contract as durable backends.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::identifiers::BadgeSlug;
use crate::core::identifiers::FlagName;
use crate::core::identifiers::MissionId;
use crate::core::identifiers::NodeId;
use crate::core::identifiers::ScopeId;
use crate::core::identifiers::UserId;
use crate::core::records::CompletionRecord;
use crate::core::records::SubmissionRecord;
use crate::core::records::SubmissionStatus;
use crate::interfaces::CoachDirectory;
use crate::interfaces::CompletionInsert;
use crate::interfaces::DirectoryError;
use crate::interfaces::FlagStore;
use crate::interfaces::FlagStoreError;
use crate::interfaces::LedgerError;
use crate::interfaces::LevelInfo;
use crate::interfaces::MetadataError;
use crate::interfaces::MetadataStore;
use crate::interfaces::NotificationDispatcher;
use crate::interfaces::NotifyError;
use crate::interfaces::ProgressStore;
use crate::interfaces::ProgressStoreError;
use crate::interfaces::RewardsLedger;

// ============================================================================
// SECTION: Lock Helper
// ============================================================================

/// Locks a mutex, mapping poisoning into a store-style error message.
fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, String> {
    mutex.lock().map_err(|_| format!("{what} mutex poisoned"))
}

// ============================================================================
// SECTION: Flag Store
// ============================================================================

/// In-memory flag store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFlagStore {
    /// Set of `(user, flag)` facts protected by a mutex.
    flags: Arc<Mutex<BTreeSet<(UserId, String)>>>,
}

impl InMemoryFlagStore {
    /// Creates a new in-memory flag store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for InMemoryFlagStore {
    fn has_flag(&self, user: UserId, flag: &FlagName) -> Result<bool, FlagStoreError> {
        let guard = lock(&self.flags, "flag store").map_err(FlagStoreError::Store)?;
        Ok(guard.contains(&(user, flag.as_str().to_string())))
    }

    fn set_flag(&self, user: UserId, flag: &FlagName) -> Result<(), FlagStoreError> {
        let mut guard = lock(&self.flags, "flag store").map_err(FlagStoreError::Store)?;
        guard.insert((user, flag.as_str().to_string()));
        Ok(())
    }
}

// ============================================================================
// SECTION: Rewards Ledger
// ============================================================================

/// Mutable ledger state behind the in-memory rewards ledger.
#[derive(Debug, Default)]
struct LedgerState {
    /// Point balances per user.
    points: BTreeMap<UserId, i64>,
    /// Owned badges per user.
    badges: BTreeSet<(UserId, String)>,
    /// Current level name per user.
    levels: BTreeMap<UserId, String>,
    /// Log of point grants for assertions: `(user, amount, reason)`.
    grants: Vec<(UserId, i64, String)>,
}

/// In-memory rewards ledger.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRewardsLedger {
    /// Ledger state protected by a mutex.
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryRewardsLedger {
    /// Creates a new in-memory rewards ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a user's point balance directly.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when the ledger lock is poisoned.
    pub fn set_points(&self, user: UserId, points: i64) -> Result<(), LedgerError> {
        let mut guard = lock(&self.state, "rewards ledger").map_err(LedgerError::Ledger)?;
        guard.points.insert(user, points);
        Ok(())
    }

    /// Sets a user's level name directly.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when the ledger lock is poisoned.
    pub fn set_level(&self, user: UserId, level: impl Into<String>) -> Result<(), LedgerError> {
        let mut guard = lock(&self.state, "rewards ledger").map_err(LedgerError::Ledger)?;
        guard.levels.insert(user, level.into());
        Ok(())
    }

    /// Returns the log of point grants recorded so far.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when the ledger lock is poisoned.
    pub fn point_grants(&self) -> Result<Vec<(UserId, i64, String)>, LedgerError> {
        let guard = lock(&self.state, "rewards ledger").map_err(LedgerError::Ledger)?;
        Ok(guard.grants.clone())
    }
}

impl RewardsLedger for InMemoryRewardsLedger {
    fn add_points(&self, user: UserId, amount: i64, reason: &str) -> Result<(), LedgerError> {
        let mut guard = lock(&self.state, "rewards ledger").map_err(LedgerError::Ledger)?;
        *guard.points.entry(user).or_insert(0) += amount;
        guard.grants.push((user, amount, reason.to_string()));
        Ok(())
    }

    fn award_badge(&self, user: UserId, badge: &BadgeSlug) -> Result<(), LedgerError> {
        let mut guard = lock(&self.state, "rewards ledger").map_err(LedgerError::Ledger)?;
        guard.badges.insert((user, badge.as_str().to_string()));
        Ok(())
    }

    fn has_badge(&self, user: UserId, badge: &BadgeSlug) -> Result<bool, LedgerError> {
        let guard = lock(&self.state, "rewards ledger").map_err(LedgerError::Ledger)?;
        Ok(guard.badges.contains(&(user, badge.as_str().to_string())))
    }

    fn total_points(&self, user: UserId) -> Result<i64, LedgerError> {
        let guard = lock(&self.state, "rewards ledger").map_err(LedgerError::Ledger)?;
        Ok(guard.points.get(&user).copied().unwrap_or(0))
    }

    fn level(&self, user: UserId) -> Result<Option<LevelInfo>, LedgerError> {
        let guard = lock(&self.state, "rewards ledger").map_err(LedgerError::Ledger)?;
        Ok(guard.levels.get(&user).map(|name| LevelInfo {
            name: name.clone(),
        }))
    }
}

// ============================================================================
// SECTION: Metadata Store
// ============================================================================

/// In-memory per-user metadata store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryMetadataStore {
    /// Metadata entries keyed by `(user, key)`, protected by a mutex.
    entries: Arc<Mutex<BTreeMap<(UserId, String), String>>>,
}

impl InMemoryMetadataStore {
    /// Creates a new in-memory metadata store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a metadata value for a user.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] when the store lock is poisoned.
    pub fn set(
        &self,
        user: UserId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), MetadataError> {
        let mut guard = lock(&self.entries, "metadata store").map_err(MetadataError::Store)?;
        guard.insert((user, key.into()), value.into());
        Ok(())
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn get(&self, user: UserId, key: &str) -> Result<Option<String>, MetadataError> {
        let guard = lock(&self.entries, "metadata store").map_err(MetadataError::Store)?;
        Ok(guard.get(&(user, key.to_string())).cloned())
    }
}

// ============================================================================
// SECTION: Coach Directory
// ============================================================================

/// Mutable state behind the in-memory coach directory.
#[derive(Debug, Default)]
struct DirectoryState {
    /// Global coach assignments per student.
    global: BTreeMap<UserId, UserId>,
    /// Scoped coach assignments keyed by `(student, scope)`.
    scoped: BTreeMap<(UserId, String), UserId>,
    /// Users holding the global admin capability.
    admins: BTreeSet<UserId>,
}

/// In-memory coach directory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCoachDirectory {
    /// Directory state protected by a mutex.
    state: Arc<Mutex<DirectoryState>>,
}

impl InMemoryCoachDirectory {
    /// Creates a new in-memory coach directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a coach to a student globally.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the directory lock is poisoned.
    pub fn assign_coach(&self, student: UserId, coach: UserId) -> Result<(), DirectoryError> {
        let mut guard = lock(&self.state, "coach directory").map_err(DirectoryError::Directory)?;
        guard.global.insert(student, coach);
        Ok(())
    }

    /// Assigns a coach to a student within a scope.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the directory lock is poisoned.
    pub fn assign_scoped_coach(
        &self,
        student: UserId,
        scope: &ScopeId,
        coach: UserId,
    ) -> Result<(), DirectoryError> {
        let mut guard = lock(&self.state, "coach directory").map_err(DirectoryError::Directory)?;
        guard.scoped.insert((student, scope.as_str().to_string()), coach);
        Ok(())
    }

    /// Grants the global admin capability to a user.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the directory lock is poisoned.
    pub fn grant_admin(&self, user: UserId) -> Result<(), DirectoryError> {
        let mut guard = lock(&self.state, "coach directory").map_err(DirectoryError::Directory)?;
        guard.admins.insert(user);
        Ok(())
    }
}

impl CoachDirectory for InMemoryCoachDirectory {
    fn assigned_coach(
        &self,
        student: UserId,
        scope: Option<&ScopeId>,
    ) -> Result<Option<UserId>, DirectoryError> {
        let guard = lock(&self.state, "coach directory").map_err(DirectoryError::Directory)?;
        if let Some(scope) = scope
            && let Some(coach) = guard.scoped.get(&(student, scope.as_str().to_string()))
        {
            return Ok(Some(*coach));
        }
        Ok(guard.global.get(&student).copied())
    }

    fn is_admin(&self, user: UserId) -> Result<bool, DirectoryError> {
        let guard = lock(&self.state, "coach directory").map_err(DirectoryError::Directory)?;
        Ok(guard.admins.contains(&user))
    }
}

// ============================================================================
// SECTION: Progress Store
// ============================================================================

/// Mutable state behind the in-memory progress store.
#[derive(Debug, Default)]
struct ProgressState {
    /// Completion records keyed by `(user, node)`.
    completions: BTreeMap<(UserId, String), CompletionRecord>,
    /// Append-only submission audit trail.
    submissions: Vec<SubmissionRecord>,
}

/// In-memory progress store.
///
/// The completion insert is atomic under the state mutex, honoring the same
/// at-most-once contract as durable backends.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProgressStore {
    /// Progress state protected by a mutex.
    state: Arc<Mutex<ProgressState>>,
}

impl InMemoryProgressStore {
    /// Creates a new in-memory progress store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every submission row recorded so far, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressStoreError`] when the store lock is poisoned.
    pub fn all_submissions(&self) -> Result<Vec<SubmissionRecord>, ProgressStoreError> {
        let guard = lock(&self.state, "progress store").map_err(ProgressStoreError::Store)?;
        Ok(guard.submissions.clone())
    }
}

impl ProgressStore for InMemoryProgressStore {
    fn insert_completion(
        &self,
        record: &CompletionRecord,
    ) -> Result<CompletionInsert, ProgressStoreError> {
        let mut guard = lock(&self.state, "progress store").map_err(ProgressStoreError::Store)?;
        let key = (record.user_id, record.node_id.as_str().to_string());
        if guard.completions.contains_key(&key) {
            return Ok(CompletionInsert::AlreadyExists);
        }
        guard.completions.insert(key, record.clone());
        Ok(CompletionInsert::Inserted)
    }

    fn completion(
        &self,
        user: UserId,
        node: &NodeId,
    ) -> Result<Option<CompletionRecord>, ProgressStoreError> {
        let guard = lock(&self.state, "progress store").map_err(ProgressStoreError::Store)?;
        Ok(guard.completions.get(&(user, node.as_str().to_string())).cloned())
    }

    fn append_submission(&self, record: &SubmissionRecord) -> Result<(), ProgressStoreError> {
        let mut guard = lock(&self.state, "progress store").map_err(ProgressStoreError::Store)?;
        guard.submissions.push(record.clone());
        Ok(())
    }

    fn submissions(
        &self,
        target: UserId,
        mission: &MissionId,
    ) -> Result<Vec<SubmissionRecord>, ProgressStoreError> {
        let guard = lock(&self.state, "progress store").map_err(ProgressStoreError::Store)?;
        Ok(guard
            .submissions
            .iter()
            .filter(|row| row.target_user_id == target && row.mission_id == *mission)
            .cloned()
            .collect())
    }

    fn resolve_pending_submissions(
        &self,
        target: UserId,
        mission: &MissionId,
        status: SubmissionStatus,
    ) -> Result<u32, ProgressStoreError> {
        let mut guard = lock(&self.state, "progress store").map_err(ProgressStoreError::Store)?;
        let mut changed = 0u32;
        for row in &mut guard.submissions {
            if row.target_user_id == target
                && row.mission_id == *mission
                && row.status == SubmissionStatus::Pending
            {
                row.status = status;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

// ============================================================================
// SECTION: Notification Dispatcher
// ============================================================================

/// In-memory notification dispatcher recording every delivery.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    /// Delivered notifications: `(user, title, body)`.
    sent: Arc<Mutex<Vec<(UserId, String, String)>>>,
}

impl RecordingNotifier {
    /// Creates a new recording notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the notifications delivered so far.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when the notifier lock is poisoned.
    pub fn sent(&self) -> Result<Vec<(UserId, String, String)>, NotifyError> {
        let guard = lock(&self.sent, "notifier").map_err(NotifyError::Dispatch)?;
        Ok(guard.clone())
    }
}

impl NotificationDispatcher for RecordingNotifier {
    fn notify(&self, user: UserId, title: &str, body: &str) -> Result<(), NotifyError> {
        let mut guard = lock(&self.sent, "notifier").map_err(NotifyError::Dispatch)?;
        guard.push((user, title.to_string(), body.to_string()));
        Ok(())
    }
}
