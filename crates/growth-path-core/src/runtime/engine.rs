// growth-path-core/src/runtime/engine.rs
// ============================================================================
// Module: Growth Path Engine
// Description: Path viewing, mission submission, approval, and impersonation.
// Purpose: Execute the path progress flow with injected collaborators.
// Dependencies: crate::{core, interfaces, runtime}, serde_json, tracing
// ============================================================================

//! ## Overview
//! The path engine is the single canonical execution path for progress
//! operations. All host surfaces (shortcode renderers, AJAX endpoints,
//! report generators) must call into these methods so gating, quorum, and
//! idempotency invariants hold everywhere.
//!
//! Normal negative outcomes (already completed, not permitted, still
//! counting) are typed result values, never errors. Errors are reserved for
//! infrastructure failures such as unreachable storage.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::context::Session;
use crate::core::context::ViewingContext;
use crate::core::identifiers::MissionId;
use crate::core::identifiers::ScopeId;
use crate::core::identifiers::UserId;
use crate::core::path::ActorClass;
use crate::core::path::PathSpec;
use crate::core::path::PathSpecError;
use crate::core::path::StationSpec;
use crate::core::records::CompletionOutcome;
use crate::core::records::CompletionReceipt;
use crate::core::records::PathView;
use crate::core::records::SubmissionRecord;
use crate::core::records::SubmissionStatus;
use crate::core::time::Timestamp;
use crate::interfaces::CoachDirectory;
use crate::interfaces::CompletionObserver;
use crate::interfaces::FlagStore;
use crate::interfaces::FlagStoreError;
use crate::interfaces::MetadataStore;
use crate::interfaces::NotificationDispatcher;
use crate::interfaces::ProgressStore;
use crate::interfaces::ProgressStoreError;
use crate::interfaces::RewardsLedger;
use crate::runtime::actor::GateDecision;
use crate::runtime::actor::PermitClass;
use crate::runtime::actor::check_actor;
use crate::runtime::clause::ClauseReader;
use crate::runtime::progress::StatusEvaluator;
use crate::runtime::recorder::CompletionRecorder;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Actor whitelist applied to impersonation start.
const IMPERSONATION_ACTORS: [ActorClass; 1] = [ActorClass::Coach];

/// Notification title for submissions awaiting approval.
const APPROVAL_NOTICE_TITLE: &str = "Mission submission awaiting approval";

// ============================================================================
// SECTION: Engine Options
// ============================================================================

/// Tunable engine behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Whether the assigned coach is notified when a submission enters the
    /// pending-approval state.
    pub notify_on_pending: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            notify_on_pending: true,
        }
    }
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// A mission submission request.
#[derive(Debug, Clone)]
pub struct MissionSubmission<'a> {
    /// Station whose mission is being submitted.
    pub station: &'a StationSpec,
    /// Mission the submission belongs to.
    pub mission_id: MissionId,
    /// Resolved acting/effective identity pair.
    pub context: ViewingContext,
    /// Optional coach-assignment scope for the permission check.
    pub scope: Option<ScopeId>,
    /// Remote address of the actor, when known.
    pub actor_ip: Option<String>,
    /// Opaque response payload interpreted by the activity renderer.
    pub payload: Option<serde_json::Value>,
    /// When the submission was made.
    pub submitted_at: Timestamp,
}

/// An approval or rejection request for a pending mission.
#[derive(Debug, Clone)]
pub struct ApprovalRequest<'a> {
    /// Station whose mission is being resolved.
    pub station: &'a StationSpec,
    /// Mission being resolved.
    pub mission_id: MissionId,
    /// User whose mission is being resolved.
    pub target_user: UserId,
    /// Coach or admin performing the resolution.
    pub approver: UserId,
    /// Optional coach-assignment scope for the permission check.
    pub scope: Option<ScopeId>,
    /// When the resolution was made.
    pub decided_at: Timestamp,
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Outcome of a mission submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The actor may not submit for the target. No reason is disclosed.
    Denied,
    /// The mission is already completed; nothing was recorded.
    AlreadyCompleted,
    /// The submission was recorded but quorum is not yet reached.
    Counting {
        /// Active submissions recorded so far.
        current: u32,
        /// Quorum required to fulfil the mission.
        required: u32,
    },
    /// Quorum is reached; fulfilment awaits explicit coach approval.
    PendingApproval {
        /// Active submissions recorded so far.
        current: u32,
        /// Quorum required to fulfil the mission.
        required: u32,
    },
    /// Quorum is reached and the mission completed.
    Completed(CompletionReceipt),
}

/// Outcome of an approval request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// The approver may not resolve this mission. No reason is disclosed.
    Denied,
    /// The mission is already completed.
    AlreadyCompleted,
    /// No pending submissions exist for the mission.
    NothingPending,
    /// Pending submissions exist but quorum is not reached.
    QuorumNotMet {
        /// Active submissions recorded so far.
        current: u32,
        /// Quorum required to fulfil the mission.
        required: u32,
    },
    /// The mission was approved and completed.
    Approved(CompletionReceipt),
}

/// Outcome of a rejection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionOutcome {
    /// The approver may not resolve this mission. No reason is disclosed.
    Denied,
    /// No pending submissions exist for the mission.
    NothingPending,
    /// Pending submissions were marked rejected.
    Rejected {
        /// Number of submission rows marked rejected.
        cleared: u32,
    },
}

/// Outcome of an impersonation start request.
///
/// Denials and invalid targets are indistinguishable: the host strips the
/// triggering parameter and renders normally, leaking nothing about which
/// users exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpersonationOutcome {
    /// The session now acts with the target's identity.
    Started,
    /// The request was silently ignored.
    Ignored,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Path engine infrastructure errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Path specification failed validation.
    #[error("invalid path spec: {0}")]
    InvalidSpec(#[from] PathSpecError),
    /// Progress store error.
    #[error(transparent)]
    Progress(#[from] ProgressStoreError),
    /// Flag store error.
    #[error(transparent)]
    Flags(#[from] FlagStoreError),
}

// ============================================================================
// SECTION: Path Engine
// ============================================================================

/// Path engine executing progress operations over injected collaborators.
///
/// Constructed once per process or request with explicit dependencies; path
/// and station definitions are passed as plain data into each operation.
pub struct PathEngine<F, L, M, C, S, N> {
    /// Flag store collaborator.
    flags: F,
    /// Rewards ledger collaborator.
    ledger: L,
    /// Metadata store collaborator.
    metadata: M,
    /// Coach directory collaborator.
    coaches: C,
    /// Progress store collaborator.
    progress: S,
    /// Notification dispatcher collaborator.
    notifier: N,
    /// Observers notified once per recorded completion.
    observers: Vec<Box<dyn CompletionObserver + Send + Sync>>,
    /// Tunable engine behavior.
    options: EngineOptions,
}

impl<F, L, M, C, S, N> PathEngine<F, L, M, C, S, N>
where
    F: FlagStore,
    L: RewardsLedger,
    M: MetadataStore,
    C: CoachDirectory,
    S: ProgressStore,
    N: NotificationDispatcher,
{
    /// Creates a new path engine with default options.
    #[must_use]
    pub fn new(flags: F, ledger: L, metadata: M, coaches: C, progress: S, notifier: N) -> Self {
        Self {
            flags,
            ledger,
            metadata,
            coaches,
            progress,
            notifier,
            observers: Vec::new(),
            options: EngineOptions::default(),
        }
    }

    /// Replaces the engine options.
    #[must_use]
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers a completion observer.
    pub fn register_observer(&mut self, observer: Box<dyn CompletionObserver + Send + Sync>) {
        self.observers.push(observer);
    }

    // ========================================================================
    // SECTION: Viewing
    // ========================================================================

    /// Processes a path for a user, producing the rendered-ready view.
    ///
    /// Derived state is recomputed from scratch on every call; nothing is
    /// cached between renders.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the spec is invalid or storage fails.
    pub fn view_path(&self, user: UserId, spec: &PathSpec) -> Result<PathView, EngineError> {
        spec.validate()?;
        self.status_evaluator(user).process_path(user, spec)
    }

    // ========================================================================
    // SECTION: Submission
    // ========================================================================

    /// Handles a mission submission: permission gate, quorum tally, and
    /// conditional fulfilment.
    ///
    /// Every permitted submission appends an audit row, regardless of quorum
    /// state. Fulfilment fires once quorum is reached: immediately, or after
    /// explicit approval when the station requires it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when storage fails.
    pub fn submit_mission(
        &self,
        request: &MissionSubmission<'_>,
    ) -> Result<SubmitOutcome, EngineError> {
        let station = request.station;
        let target = request.context.effective_user();
        let actor = request.context.real_actor();

        let decision = check_actor(
            &station.allowed_actors,
            target,
            actor,
            request.scope.as_ref(),
            &self.coaches,
        );
        let GateDecision::Permit(permit) = decision else {
            tracing::debug!(
                target = %target,
                actor = %actor,
                mission = %request.mission_id,
                "submission denied by actor gate"
            );
            return Ok(SubmitOutcome::Denied);
        };

        if self.progress.has_completion(target, &station.node_id)? {
            return Ok(SubmitOutcome::AlreadyCompleted);
        }

        self.progress.append_submission(&SubmissionRecord {
            target_user_id: target,
            actor_user_id: actor,
            actor_ip: request.actor_ip.clone(),
            mission_kind: station.mission_kind.clone(),
            mission_id: request.mission_id.clone(),
            payload: request.payload.clone(),
            status: SubmissionStatus::Pending,
            submitted_at: request.submitted_at,
        })?;

        let current = self.active_submissions(target, &request.mission_id)?;
        let required = station.required_submissions;
        if current < required {
            return Ok(SubmitOutcome::Counting {
                current,
                required,
            });
        }

        if station.requires_approval {
            self.notify_pending(target, request.scope.as_ref(), &request.mission_id);
            return Ok(SubmitOutcome::PendingApproval {
                current,
                required,
            });
        }

        let completed_by_coach = matches!(permit, PermitClass::Coach | PermitClass::Admin);
        match self.recorder().record(
            target,
            station,
            completed_by_coach,
            true,
            request.submitted_at,
        )? {
            CompletionOutcome::Recorded(receipt) => {
                self.progress.resolve_pending_submissions(
                    target,
                    &request.mission_id,
                    SubmissionStatus::Completed,
                )?;
                Ok(SubmitOutcome::Completed(receipt))
            }
            CompletionOutcome::AlreadyCompleted => Ok(SubmitOutcome::AlreadyCompleted),
        }
    }

    // ========================================================================
    // SECTION: Approval
    // ========================================================================

    /// Approves a pending mission, completing it.
    ///
    /// Only the target's assigned coach or an admin may approve.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when storage fails.
    pub fn approve_mission(
        &self,
        request: &ApprovalRequest<'_>,
    ) -> Result<ApprovalOutcome, EngineError> {
        if !self.resolver_permitted(request) {
            return Ok(ApprovalOutcome::Denied);
        }

        if self.progress.has_completion(request.target_user, &request.station.node_id)? {
            return Ok(ApprovalOutcome::AlreadyCompleted);
        }

        let pending = self.pending_submissions(request.target_user, &request.mission_id)?;
        if pending == 0 {
            return Ok(ApprovalOutcome::NothingPending);
        }
        let required = request.station.required_submissions;
        if pending < required {
            return Ok(ApprovalOutcome::QuorumNotMet {
                current: pending,
                required,
            });
        }

        match self.recorder().record(
            request.target_user,
            request.station,
            true,
            true,
            request.decided_at,
        )? {
            CompletionOutcome::Recorded(receipt) => {
                self.progress.resolve_pending_submissions(
                    request.target_user,
                    &request.mission_id,
                    SubmissionStatus::Completed,
                )?;
                Ok(ApprovalOutcome::Approved(receipt))
            }
            CompletionOutcome::AlreadyCompleted => Ok(ApprovalOutcome::AlreadyCompleted),
        }
    }

    /// Rejects a pending mission.
    ///
    /// Rejected rows stay in the audit trail but stop counting toward
    /// quorum, so the mission returns to counting and fresh submissions are
    /// required.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when storage fails.
    pub fn reject_mission(
        &self,
        request: &ApprovalRequest<'_>,
    ) -> Result<RejectionOutcome, EngineError> {
        if !self.resolver_permitted(request) {
            return Ok(RejectionOutcome::Denied);
        }

        let cleared = self.progress.resolve_pending_submissions(
            request.target_user,
            &request.mission_id,
            SubmissionStatus::Rejected,
        )?;
        if cleared == 0 {
            return Ok(RejectionOutcome::NothingPending);
        }
        Ok(RejectionOutcome::Rejected {
            cleared,
        })
    }

    // ========================================================================
    // SECTION: Direct Recording
    // ========================================================================

    /// Records a completion directly, bypassing quorum.
    ///
    /// Used by host surfaces where the activity itself reports completion
    /// (for example a verified form submission callback).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the primary completion write fails.
    pub fn record_completion(
        &self,
        user: UserId,
        station: &StationSpec,
        completed_by_coach: bool,
        fire_rewards: bool,
        now: Timestamp,
    ) -> Result<CompletionOutcome, EngineError> {
        self.recorder().record(user, station, completed_by_coach, fire_rewards, now)
    }

    // ========================================================================
    // SECTION: Impersonation
    // ========================================================================

    /// Starts coach impersonation of `target` on the given session.
    ///
    /// Permitted for the target's assigned coach (or an admin). Anything
    /// else, including an invalid target, is silently ignored.
    pub fn start_impersonation(
        &self,
        session: &mut Session,
        target: UserId,
        scope: Option<&ScopeId>,
    ) -> ImpersonationOutcome {
        let actor = session.resolve_context().real_actor();
        if target.is_guest() || actor.is_guest() || actor == target {
            return ImpersonationOutcome::Ignored;
        }

        let decision = check_actor(&IMPERSONATION_ACTORS, target, actor, scope, &self.coaches);
        if !decision.is_permitted() {
            tracing::debug!(actor = %actor, "impersonation request ignored");
            return ImpersonationOutcome::Ignored;
        }

        session.begin_impersonation(target);
        ImpersonationOutcome::Started
    }

    /// Stops impersonation on the given session, restoring the original
    /// identity. A no-op when the session is not impersonating.
    pub fn stop_impersonation(&self, session: &mut Session) {
        session.end_impersonation();
    }

    // ========================================================================
    // SECTION: Internal Helpers
    // ========================================================================

    /// Builds a status evaluator scoped to one user.
    fn status_evaluator(&self, user: UserId) -> StatusEvaluator<'_> {
        StatusEvaluator::new(
            &self.progress,
            &self.flags,
            ClauseReader::new(user, &self.flags, &self.ledger, &self.metadata),
        )
    }

    /// Builds a completion recorder over the engine collaborators.
    fn recorder(&self) -> CompletionRecorder<'_> {
        CompletionRecorder::new(&self.progress, &self.flags, &self.ledger, &self.observers)
    }

    /// Checks whether an approval-request approver passes the coach gate.
    fn resolver_permitted(&self, request: &ApprovalRequest<'_>) -> bool {
        let decision = check_actor(
            &IMPERSONATION_ACTORS,
            request.target_user,
            request.approver,
            request.scope.as_ref(),
            &self.coaches,
        );
        if !decision.is_permitted() {
            tracing::debug!(
                approver = %request.approver,
                target = %request.target_user,
                mission = %request.mission_id,
                "mission resolution denied by actor gate"
            );
        }
        decision.is_permitted()
    }

    /// Counts submissions that count toward quorum (not rejected).
    fn active_submissions(&self, target: UserId, mission: &MissionId) -> Result<u32, EngineError> {
        let rows = self.progress.submissions(target, mission)?;
        let count = rows.iter().filter(|row| row.status != SubmissionStatus::Rejected).count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    /// Counts submissions still awaiting resolution.
    fn pending_submissions(&self, target: UserId, mission: &MissionId) -> Result<u32, EngineError> {
        let rows = self.progress.submissions(target, mission)?;
        let count = rows.iter().filter(|row| row.status == SubmissionStatus::Pending).count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    /// Notifies the assigned coach that a submission awaits approval.
    ///
    /// Best-effort: a missing coach or a failed dispatch is logged, never
    /// surfaced.
    fn notify_pending(&self, target: UserId, scope: Option<&ScopeId>, mission: &MissionId) {
        if !self.options.notify_on_pending {
            return;
        }
        let coach = match self.coaches.assigned_coach(target, scope) {
            Ok(Some(coach)) => coach,
            Ok(None) => {
                tracing::debug!(target = %target, "no assigned coach to notify");
                return;
            }
            Err(err) => {
                tracing::warn!(target = %target, error = %err, "coach lookup failed; skipping notification");
                return;
            }
        };
        let body =
            format!("A submission for mission '{mission}' by student {target} awaits approval.");
        if let Err(err) = self.notifier.notify(coach, APPROVAL_NOTICE_TITLE, &body) {
            tracing::warn!(coach = %coach, error = %err, "approval notification failed; continuing");
        }
    }
}
