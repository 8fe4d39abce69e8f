// growth-path-core/src/runtime/recorder.rs
// ============================================================================
// Module: Growth Path Completion Recorder
// Description: Idempotent, at-most-once completion persistence.
// Purpose: Record completions, set flags, and dispatch rewards best-effort.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! The recorder is the only writer of completion records. The progress
//! store's atomic insert makes recording at-most-once even under concurrent
//! writers: the second writer observes `AlreadyCompleted`, never a raw
//! conflict. Flag-setting and reward dispatch follow the primary write and
//! are best-effort; their failures are summarized and logged, never
//! propagated, so a missing rewards backend cannot block progress.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::identifiers::UserId;
use crate::core::path::StationSpec;
use crate::core::records::CompletionOutcome;
use crate::core::records::CompletionReceipt;
use crate::core::records::CompletionRecord;
use crate::core::rewards::RewardAction;
use crate::core::rewards::RewardSkip;
use crate::core::rewards::RewardsSummary;
use crate::core::time::Timestamp;
use crate::interfaces::CompletionInsert;
use crate::interfaces::CompletionObserver;
use crate::interfaces::FlagStore;
use crate::interfaces::ProgressStore;
use crate::interfaces::RewardsLedger;
use crate::runtime::engine::EngineError;

// ============================================================================
// SECTION: Completion Recorder
// ============================================================================

/// Records station completions with at-most-once semantics.
pub struct CompletionRecorder<'a> {
    /// Progress store holding completion records.
    progress: &'a dyn ProgressStore,
    /// Flag store for completion-time flag setting.
    flags: &'a dyn FlagStore,
    /// Rewards ledger for best-effort dispatch.
    ledger: &'a dyn RewardsLedger,
    /// Observers notified once per recorded completion.
    observers: &'a [Box<dyn CompletionObserver + Send + Sync>],
}

impl<'a> CompletionRecorder<'a> {
    /// Creates a completion recorder over the given collaborators.
    #[must_use]
    pub const fn new(
        progress: &'a dyn ProgressStore,
        flags: &'a dyn FlagStore,
        ledger: &'a dyn RewardsLedger,
        observers: &'a [Box<dyn CompletionObserver + Send + Sync>],
    ) -> Self {
        Self {
            progress,
            flags,
            ledger,
            observers,
        }
    }

    /// Records a completion for `(user, station)` if none exists yet.
    ///
    /// Duplicate calls are safe no-ops after the first: they return
    /// [`CompletionOutcome::AlreadyCompleted`] without writing or dispatching
    /// anything. On first success the station's completion flag is set and,
    /// when `fire_rewards` holds, its reward actions are dispatched; both are
    /// best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] only when the primary completion write fails.
    pub fn record(
        &self,
        user: UserId,
        station: &StationSpec,
        completed_by_coach: bool,
        fire_rewards: bool,
        now: Timestamp,
    ) -> Result<CompletionOutcome, EngineError> {
        let record = CompletionRecord {
            user_id: user,
            node_id: station.node_id.clone(),
            completed_at: now,
            completed_by_coach,
            mission_kind: station.mission_kind.clone(),
        };

        match self.progress.insert_completion(&record)? {
            CompletionInsert::AlreadyExists => return Ok(CompletionOutcome::AlreadyCompleted),
            CompletionInsert::Inserted => {}
        }

        self.set_completion_flag(user, station);

        let rewards = if fire_rewards {
            self.dispatch_rewards(user, station)
        } else {
            RewardsSummary::default()
        };

        for observer in self.observers {
            observer.on_completion(&record);
        }

        Ok(CompletionOutcome::Recorded(CompletionReceipt {
            record,
            rewards,
        }))
    }

    /// Sets the station's completion flag, if one is configured.
    ///
    /// Best-effort: flags are monotonic and re-derivable, so a failed write
    /// is logged and tolerated rather than rolled into the primary outcome.
    fn set_completion_flag(&self, user: UserId, station: &StationSpec) {
        let Some(flag) = &station.sets_flag else {
            return;
        };
        if let Err(err) = self.flags.set_flag(user, flag) {
            tracing::warn!(
                user = %user,
                %flag,
                error = %err,
                "completion flag write failed; continuing"
            );
        }
    }

    /// Dispatches the station's reward actions, collecting a summary.
    fn dispatch_rewards(&self, user: UserId, station: &StationSpec) -> RewardsSummary {
        let mut summary = RewardsSummary::default();
        let reason = format!("Growth path station '{}' completed", station.node_id);

        for action in &station.rewards {
            let result = match action {
                RewardAction::AddPoints {
                    amount,
                } => self.ledger.add_points(user, *amount, &reason),
                RewardAction::AwardBadge {
                    badge,
                } => self.ledger.award_badge(user, badge),
                RewardAction::Unrecognized {
                    key, ..
                } => {
                    tracing::warn!(key = %key, "unrecognized reward type; skipping");
                    summary.skipped.push(RewardSkip {
                        action: action.clone(),
                        reason: format!("unrecognized reward type: {key}"),
                    });
                    continue;
                }
            };

            match result {
                Ok(()) => summary.granted.push(action.clone()),
                Err(err) => {
                    tracing::warn!(
                        user = %user,
                        node = %station.node_id,
                        error = %err,
                        "reward dispatch failed; continuing"
                    );
                    summary.skipped.push(RewardSkip {
                        action: action.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        summary
    }
}
