// growth-path-core/src/core/records.rs
// ============================================================================
// Module: Growth Path Records
// Description: Persisted completion/submission records and derived status.
// Purpose: Provide stable, serializable types for progress state and results.
// Dependencies: crate::core::{identifiers, path, rewards, time}, serde
// ============================================================================

//! ## Overview
//! Completion records are the durable evidence of progress: at most one ever
//! exists per `(user, station)` pair and it is never retracted through the
//! normal flow. Submission records are the append-only audit trail counted by
//! the quorum tracker. Station status is derived on every read and is never
//! persisted or cached, because upstream state (flags, points) can change
//! between renders.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::MissionId;
use crate::core::identifiers::NodeId;
use crate::core::identifiers::PathInstanceId;
use crate::core::identifiers::UserId;
use crate::core::path::MissionKind;
use crate::core::rewards::RewardsSummary;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Completion Records
// ============================================================================

/// Durable record of one station completion.
///
/// # Invariants
/// - At most one record ever exists per `(user_id, node_id)`; the progress
///   store enforces this, including under concurrent writers.
/// - Records are monotonic and never retracted through the normal flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// User the completion belongs to.
    pub user_id: UserId,
    /// Completed station.
    pub node_id: NodeId,
    /// When the completion was recorded.
    pub completed_at: Timestamp,
    /// Whether a coach recorded the completion on the user's behalf.
    pub completed_by_coach: bool,
    /// Mission kind of the completed station.
    pub mission_kind: MissionKind,
}

/// Outcome of recording a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The completion was recorded for the first time.
    Recorded(CompletionReceipt),
    /// A record already existed; nothing was written or dispatched.
    AlreadyCompleted,
}

/// Receipt for a freshly recorded completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReceipt {
    /// The record that was written.
    pub record: CompletionRecord,
    /// Outcome of best-effort reward dispatch.
    pub rewards: RewardsSummary,
}

// ============================================================================
// SECTION: Submission Records
// ============================================================================

/// Lifecycle status of a submission audit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Counted toward quorum; awaiting finalization or approval.
    Pending,
    /// Finalized as part of a completed mission.
    Completed,
    /// Rejected by a coach; kept for audit but no longer counted.
    Rejected,
}

/// Append-only audit row for one mission submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// User whose mission the submission targets.
    pub target_user_id: UserId,
    /// User who performed the submission.
    pub actor_user_id: UserId,
    /// Remote address of the actor, when known.
    pub actor_ip: Option<String>,
    /// Mission kind of the submitted station.
    pub mission_kind: MissionKind,
    /// Mission the submission belongs to.
    pub mission_id: MissionId,
    /// Opaque response payload interpreted by the activity renderer.
    pub payload: Option<serde_json::Value>,
    /// Lifecycle status of this row.
    pub status: SubmissionStatus,
    /// When the submission was recorded.
    pub submitted_at: Timestamp,
}

// ============================================================================
// SECTION: Derived Station Status
// ============================================================================

/// Derived unlock status of a station.
///
/// Never persisted; recomputed on every read from completion records, flags,
/// and prior-station state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationStatus {
    /// Gated by sequence or unmet conditions.
    Locked,
    /// Unlocked and awaiting completion.
    Open,
    /// Completed.
    Completed,
}

/// Derived per-station state handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationState {
    /// Station the state belongs to.
    pub node_id: NodeId,
    /// Derived unlock status.
    pub status: StationStatus,
}

impl StationState {
    /// Returns `true` when the station is completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == StationStatus::Completed
    }

    /// Returns `true` when the station is not locked.
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.status != StationStatus::Locked
    }
}

// ============================================================================
// SECTION: Path View
// ============================================================================

/// Progress indicator totals over the visible stations of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathProgress {
    /// Number of visible stations completed.
    pub completed: u32,
    /// Number of visible stations in total.
    pub total_visible: u32,
}

/// Rendered-ready view of a processed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathView {
    /// Instance identifier of the processed path.
    pub instance_id: PathInstanceId,
    /// Derived states for visible stations, in authored order.
    pub stations: Vec<StationState>,
    /// Progress indicator totals.
    pub progress: PathProgress,
}
