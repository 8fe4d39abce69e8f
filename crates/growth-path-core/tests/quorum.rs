// growth-path-core/tests/quorum.rs
// ============================================================================
// Module: Submission Quorum Tests
// Description: Validate quorum counting, approval gating, and rejection.
// ============================================================================
//! ## Overview
//! Exercises the mission submission flow end to end: actor gating, audit
//! rows, quorum thresholds, approval and rejection semantics, and coach
//! notification.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use common::COACH;
use common::Fixture;
use common::STRANGER;
use common::STUDENT;
use common::compile_path;
use common::find_station;
use common::now;
use common::station;
use growth_path_core::ApprovalOutcome;
use growth_path_core::ApprovalRequest;
use growth_path_core::MissionId;
use growth_path_core::MissionSubmission;
use growth_path_core::PathSpec;
use growth_path_core::ProgressStore;
use growth_path_core::RejectionOutcome;
use growth_path_core::StationConfig;
use growth_path_core::StationSpec;
use growth_path_core::SubmissionStatus;
use growth_path_core::SubmitOutcome;
use growth_path_core::UserId;
use growth_path_core::ViewingContext;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Compiles a single-station path requiring `quorum` submissions.
fn quorum_path(quorum: u32, requires_approval: bool) -> PathSpec {
    compile_path(vec![StationConfig {
        allowed_actors: "self,coach,users".to_string(),
        required_submissions: Some(quorum),
        requires_approval,
        rewards: "add_points:10".to_string(),
        ..station("st1")
    }])
}

/// Builds a submission request from `actor` targeting the student.
fn submission<'a>(st: &'a StationSpec, actor: UserId) -> MissionSubmission<'a> {
    MissionSubmission {
        station: st,
        mission_id: MissionId::from("mission-st1"),
        context: if actor == STUDENT {
            ViewingContext::direct(STUDENT)
        } else {
            ViewingContext::impersonated(actor, STUDENT)
        },
        scope: None,
        actor_ip: Some("198.51.100.7".to_string()),
        payload: None,
        submitted_at: now(),
    }
}

/// Builds an approval request from `approver` for the student's mission.
fn approval<'a>(st: &'a StationSpec, approver: UserId) -> ApprovalRequest<'a> {
    ApprovalRequest {
        station: st,
        mission_id: MissionId::from("mission-st1"),
        target_user: STUDENT,
        approver,
        scope: None,
        decided_at: now(),
    }
}

// ============================================================================
// SECTION: Quorum Counting
// ============================================================================

#[test]
fn test_single_submission_quorum_completes_immediately() {
    let fixture = Fixture::new();
    let spec = quorum_path(1, false);
    let st = find_station(&spec, "st1");

    let outcome = fixture.engine.submit_mission(&submission(st, STUDENT)).unwrap();
    assert!(matches!(outcome, SubmitOutcome::Completed(_)));
    assert_eq!(fixture.ledger.point_grants().unwrap().len(), 1);
}

#[test]
fn test_quorum_counts_until_threshold_then_completes() {
    let fixture = Fixture::new();
    fixture.coaches.assign_coach(STUDENT, COACH).unwrap();
    let spec = quorum_path(3, false);
    let st = find_station(&spec, "st1");

    let first = fixture.engine.submit_mission(&submission(st, STUDENT)).unwrap();
    assert_eq!(first, SubmitOutcome::Counting {
        current: 1,
        required: 3,
    });

    let second = fixture.engine.submit_mission(&submission(st, COACH)).unwrap();
    assert_eq!(second, SubmitOutcome::Counting {
        current: 2,
        required: 3,
    });

    let third = fixture.engine.submit_mission(&submission(st, STRANGER)).unwrap();
    assert!(matches!(third, SubmitOutcome::Completed(_)));

    // Exactly one reward dispatch for the whole quorum.
    assert_eq!(fixture.ledger.point_grants().unwrap().len(), 1);

    // All audit rows were finalized.
    let rows = fixture.progress.all_submissions().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.status == SubmissionStatus::Completed));
}

#[test]
fn test_every_submission_appends_an_audit_row() {
    let fixture = Fixture::new();
    let spec = quorum_path(2, false);
    let st = find_station(&spec, "st1");

    fixture.engine.submit_mission(&submission(st, STUDENT)).unwrap();
    let rows = fixture.progress.all_submissions().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].target_user_id, STUDENT);
    assert_eq!(rows[0].actor_user_id, STUDENT);
    assert_eq!(rows[0].actor_ip.as_deref(), Some("198.51.100.7"));
    assert_eq!(rows[0].status, SubmissionStatus::Pending);
}

#[test]
fn test_denied_actor_appends_nothing() {
    let fixture = Fixture::new();
    let spec = compile_path(vec![StationConfig {
        allowed_actors: "self".to_string(),
        ..station("st1")
    }]);
    let st = find_station(&spec, "st1");

    let outcome = fixture.engine.submit_mission(&submission(st, STRANGER)).unwrap();
    assert_eq!(outcome, SubmitOutcome::Denied);
    assert!(fixture.progress.all_submissions().unwrap().is_empty());
}

#[test]
fn test_completed_mission_rejects_further_submissions() {
    let fixture = Fixture::new();
    let spec = quorum_path(1, false);
    let st = find_station(&spec, "st1");

    fixture.engine.submit_mission(&submission(st, STUDENT)).unwrap();
    let again = fixture.engine.submit_mission(&submission(st, STUDENT)).unwrap();
    assert_eq!(again, SubmitOutcome::AlreadyCompleted);

    // The duplicate attempt appended no audit row.
    assert_eq!(fixture.progress.all_submissions().unwrap().len(), 1);
}

// ============================================================================
// SECTION: Approval Gating
// ============================================================================

#[test]
fn test_approval_required_holds_completion_and_notifies_coach() {
    let fixture = Fixture::new();
    fixture.coaches.assign_coach(STUDENT, COACH).unwrap();
    let spec = quorum_path(1, true);
    let st = find_station(&spec, "st1");

    let outcome = fixture.engine.submit_mission(&submission(st, STUDENT)).unwrap();
    assert_eq!(outcome, SubmitOutcome::PendingApproval {
        current: 1,
        required: 1,
    });

    // No completion, no rewards until approval.
    assert!(!fixture.progress.has_completion(STUDENT, &st.node_id).unwrap());
    assert!(fixture.ledger.point_grants().unwrap().is_empty());

    // The assigned coach was notified.
    let sent = fixture.notifier.sent().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, COACH);
}

#[test]
fn test_explicit_approval_completes_the_mission() {
    let fixture = Fixture::new();
    fixture.coaches.assign_coach(STUDENT, COACH).unwrap();
    let spec = quorum_path(1, true);
    let st = find_station(&spec, "st1");

    fixture.engine.submit_mission(&submission(st, STUDENT)).unwrap();

    let outcome = fixture.engine.approve_mission(&approval(st, COACH)).unwrap();
    assert!(matches!(outcome, ApprovalOutcome::Approved(_)));

    assert!(fixture.progress.has_completion(STUDENT, &st.node_id).unwrap());
    assert_eq!(fixture.ledger.point_grants().unwrap().len(), 1);

    let rows = fixture.progress.all_submissions().unwrap();
    assert!(rows.iter().all(|row| row.status == SubmissionStatus::Completed));

    // The completion is attributed to the coach.
    let record = fixture.progress.completion(STUDENT, &st.node_id).unwrap().unwrap();
    assert!(record.completed_by_coach);
}

#[test]
fn test_only_the_coach_or_admin_may_approve() {
    let fixture = Fixture::new();
    fixture.coaches.assign_coach(STUDENT, COACH).unwrap();
    let spec = quorum_path(1, true);
    let st = find_station(&spec, "st1");

    fixture.engine.submit_mission(&submission(st, STUDENT)).unwrap();

    // The student cannot self-approve.
    let outcome = fixture.engine.approve_mission(&approval(st, STUDENT)).unwrap();
    assert_eq!(outcome, ApprovalOutcome::Denied);
    // Neither can a stranger.
    let outcome = fixture.engine.approve_mission(&approval(st, STRANGER)).unwrap();
    assert_eq!(outcome, ApprovalOutcome::Denied);

    assert!(!fixture.progress.has_completion(STUDENT, &st.node_id).unwrap());
}

#[test]
fn test_approving_without_submissions_is_nothing_pending() {
    let fixture = Fixture::new();
    fixture.coaches.assign_coach(STUDENT, COACH).unwrap();
    let spec = quorum_path(1, true);
    let st = find_station(&spec, "st1");

    let outcome = fixture.engine.approve_mission(&approval(st, COACH)).unwrap();
    assert_eq!(outcome, ApprovalOutcome::NothingPending);
}

#[test]
fn test_approval_below_quorum_does_not_complete() {
    let fixture = Fixture::new();
    fixture.coaches.assign_coach(STUDENT, COACH).unwrap();
    let spec = quorum_path(3, true);
    let st = find_station(&spec, "st1");

    fixture.engine.submit_mission(&submission(st, STUDENT)).unwrap();

    let outcome = fixture.engine.approve_mission(&approval(st, COACH)).unwrap();
    assert_eq!(outcome, ApprovalOutcome::QuorumNotMet {
        current: 1,
        required: 3,
    });
    assert!(!fixture.progress.has_completion(STUDENT, &st.node_id).unwrap());
}

// ============================================================================
// SECTION: Rejection
// ============================================================================

#[test]
fn test_rejection_clears_the_quorum_but_keeps_the_audit_trail() {
    let fixture = Fixture::new();
    fixture.coaches.assign_coach(STUDENT, COACH).unwrap();
    let spec = quorum_path(2, true);
    let st = find_station(&spec, "st1");

    fixture.engine.submit_mission(&submission(st, STUDENT)).unwrap();
    fixture.engine.submit_mission(&submission(st, COACH)).unwrap();

    let outcome = fixture.engine.reject_mission(&approval(st, COACH)).unwrap();
    assert_eq!(outcome, RejectionOutcome::Rejected {
        cleared: 2,
    });

    // Rows survive as rejected audit entries.
    let rows = fixture.progress.all_submissions().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.status == SubmissionStatus::Rejected));

    // The mission is back to counting; a fresh submission starts over.
    let outcome = fixture.engine.submit_mission(&submission(st, STUDENT)).unwrap();
    assert_eq!(outcome, SubmitOutcome::Counting {
        current: 1,
        required: 2,
    });

    // Approving now fails quorum: rejected rows no longer count.
    let outcome = fixture.engine.approve_mission(&approval(st, COACH)).unwrap();
    assert_eq!(outcome, ApprovalOutcome::QuorumNotMet {
        current: 1,
        required: 2,
    });
}

#[test]
fn test_rejecting_without_pending_rows_is_nothing_pending() {
    let fixture = Fixture::new();
    fixture.coaches.assign_coach(STUDENT, COACH).unwrap();
    let spec = quorum_path(1, true);
    let st = find_station(&spec, "st1");

    let outcome = fixture.engine.reject_mission(&approval(st, COACH)).unwrap();
    assert_eq!(outcome, RejectionOutcome::NothingPending);
}
