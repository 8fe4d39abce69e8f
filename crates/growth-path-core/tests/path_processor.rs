// growth-path-core/tests/path_processor.rs
// ============================================================================
// Module: Path Processor Tests
// Description: Validate sequential gating, branching, and visibility.
// ============================================================================
//! ## Overview
//! Exercises the derived station list a render consumes: sequential chains,
//! independent branches, condition gating, visibility filtering, and the
//! progress indicator totals.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use common::Fixture;
use common::STUDENT;
use common::compile_path;
use common::find_station;
use common::now;
use common::station;
use growth_path_core::FlagName;
use growth_path_core::FlagStore;
use growth_path_core::StationConfig;
use growth_path_core::StationStatus;

// ============================================================================
// SECTION: Sequential Gating
// ============================================================================

#[test]
fn test_first_station_is_never_sequence_blocked() {
    let fixture = Fixture::new();
    let spec = compile_path(vec![station("st1")]);

    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    assert_eq!(view.stations[0].status, StationStatus::Open);
}

#[test]
fn test_incomplete_station_locks_everything_downstream() {
    let fixture = Fixture::new();
    let spec = compile_path(vec![station("st1"), station("st2"), station("st3")]);

    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    let statuses: Vec<StationStatus> = view.stations.iter().map(|s| s.status).collect();
    assert_eq!(statuses, vec![StationStatus::Open, StationStatus::Locked, StationStatus::Locked]);
}

#[test]
fn test_completion_unlocks_the_next_sequential_station() {
    let fixture = Fixture::new();
    let spec = compile_path(vec![station("st1"), station("st2"), station("st3")]);

    fixture
        .engine
        .record_completion(STUDENT, find_station(&spec, "st1"), false, true, now())
        .unwrap();

    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    let statuses: Vec<StationStatus> = view.stations.iter().map(|s| s.status).collect();
    assert_eq!(statuses, vec![
        StationStatus::Completed,
        StationStatus::Open,
        StationStatus::Locked
    ]);
}

// ============================================================================
// SECTION: Independent Branches
// ============================================================================

#[test]
fn test_independent_station_ignores_the_sequence() {
    let fixture = Fixture::new();
    let spec = compile_path(vec![
        station("st1"),
        StationConfig {
            unlock_trigger: "independent".to_string(),
            ..station("branch")
        },
        station("st2"),
    ]);

    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    // The branch opens despite st1 being incomplete.
    assert_eq!(view.stations[1].status, StationStatus::Open);
    // And st2 stays gated on st1, not on the branch.
    assert_eq!(view.stations[2].status, StationStatus::Locked);
}

#[test]
fn test_independent_station_does_not_advance_the_chain() {
    let fixture = Fixture::new();
    let spec = compile_path(vec![
        station("st1"),
        StationConfig {
            unlock_trigger: "independent".to_string(),
            ..station("branch")
        },
        station("st2"),
    ]);

    // Completing only the branch must not unlock st2.
    fixture
        .engine
        .record_completion(STUDENT, find_station(&spec, "branch"), false, true, now())
        .unwrap();

    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    assert_eq!(view.stations[0].status, StationStatus::Open);
    assert_eq!(view.stations[1].status, StationStatus::Completed);
    assert_eq!(view.stations[2].status, StationStatus::Locked);
}

#[test]
fn test_independent_station_with_condition() {
    let fixture = Fixture::new();
    let spec = compile_path(vec![station("st1"), StationConfig {
        unlock_trigger: "independent".to_string(),
        unlock_condition: "min_points:100".to_string(),
        ..station("bonus")
    }]);

    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    assert_eq!(view.stations[1].status, StationStatus::Locked);

    fixture.ledger.set_points(STUDENT, 120).unwrap();
    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    assert_eq!(view.stations[1].status, StationStatus::Open);
}

// ============================================================================
// SECTION: Condition Gating
// ============================================================================

#[test]
fn test_sequence_and_conditions_must_both_hold() {
    let fixture = Fixture::new();
    let spec = compile_path(vec![station("st1"), StationConfig {
        unlock_condition: "min_points:50".to_string(),
        ..station("st2")
    }]);

    // Example scenario: zero points, st1 incomplete.
    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    assert_eq!(view.stations[0].status, StationStatus::Open);
    assert_eq!(view.stations[1].status, StationStatus::Locked);

    // Sequence satisfied, condition still unmet.
    fixture
        .engine
        .record_completion(STUDENT, find_station(&spec, "st1"), false, true, now())
        .unwrap();
    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    assert_eq!(view.stations[1].status, StationStatus::Locked);

    // Both satisfied.
    fixture.ledger.set_points(STUDENT, 60).unwrap();
    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    assert_eq!(view.stations[0].status, StationStatus::Completed);
    assert_eq!(view.stations[1].status, StationStatus::Open);
}

#[test]
fn test_completed_station_stays_completed_when_conditions_regress() {
    let fixture = Fixture::new();
    let spec = compile_path(vec![StationConfig {
        unlock_condition: "min_points:50".to_string(),
        ..station("st1")
    }]);

    fixture.ledger.set_points(STUDENT, 60).unwrap();
    fixture
        .engine
        .record_completion(STUDENT, find_station(&spec, "st1"), false, true, now())
        .unwrap();

    // Points dropping below the threshold must not re-lock the station.
    fixture.ledger.set_points(STUDENT, 0).unwrap();
    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    assert_eq!(view.stations[0].status, StationStatus::Completed);
}

// ============================================================================
// SECTION: Legacy Flag Evidence
// ============================================================================

#[test]
fn test_flag_kind_accepts_flag_as_completion_evidence() {
    let fixture = Fixture::new();
    let spec = compile_path(vec![
        StationConfig {
            mission_kind: "flag".to_string(),
            mission_target: Some("orientation_done".to_string()),
            ..station("st1")
        },
        station("st2"),
    ]);

    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    assert_eq!(view.stations[0].status, StationStatus::Open);

    // Setting the target flag completes the station without any record.
    fixture.flags.set_flag(STUDENT, &FlagName::from("orientation_done")).unwrap();
    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    assert_eq!(view.stations[0].status, StationStatus::Completed);
    assert_eq!(view.stations[1].status, StationStatus::Open);
}

#[test]
fn test_new_mission_kinds_ignore_the_flag_fallback() {
    let fixture = Fixture::new();
    let spec = compile_path(vec![StationConfig {
        mission_kind: "quiz".to_string(),
        mission_target: Some("quiz_42".to_string()),
        ..station("st1")
    }]);

    fixture.flags.set_flag(STUDENT, &FlagName::from("quiz_42")).unwrap();
    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    assert_eq!(view.stations[0].status, StationStatus::Open);
}

// ============================================================================
// SECTION: Visibility
// ============================================================================

#[test]
fn test_hidden_stations_are_filtered_but_keep_gating() {
    let fixture = Fixture::new();
    let spec = compile_path(vec![
        station("st1"),
        StationConfig {
            visibility_flag: Some("beta_tester".to_string()),
            ..station("hidden")
        },
        station("st3"),
    ]);

    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    // The hidden station is absent from the render list...
    let ids: Vec<&str> = view.stations.iter().map(|s| s.node_id.as_str()).collect();
    assert_eq!(ids, vec!["st1", "st3"]);
    assert_eq!(view.progress.total_visible, 2);

    // ...but still participates in the sequential chain: completing st1
    // alone leaves st3 locked behind the hidden station.
    fixture
        .engine
        .record_completion(STUDENT, find_station(&spec, "st1"), false, true, now())
        .unwrap();
    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    assert_eq!(view.stations[1].status, StationStatus::Locked);

    // Completing the hidden station unlocks st3.
    fixture
        .engine
        .record_completion(STUDENT, find_station(&spec, "hidden"), false, true, now())
        .unwrap();
    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    assert_eq!(view.stations[1].status, StationStatus::Open);

    // Holding the visibility flag reveals the station.
    fixture.flags.set_flag(STUDENT, &FlagName::from("beta_tester")).unwrap();
    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    let ids: Vec<&str> = view.stations.iter().map(|s| s.node_id.as_str()).collect();
    assert_eq!(ids, vec!["st1", "hidden", "st3"]);
}

// ============================================================================
// SECTION: Progress and Determinism
// ============================================================================

#[test]
fn test_progress_counts_visible_completions() {
    let fixture = Fixture::new();
    let spec = compile_path(vec![station("st1"), station("st2"), station("st3")]);

    fixture
        .engine
        .record_completion(STUDENT, find_station(&spec, "st1"), false, true, now())
        .unwrap();

    let view = fixture.engine.view_path(STUDENT, &spec).unwrap();
    assert_eq!(view.progress.completed, 1);
    assert_eq!(view.progress.total_visible, 3);
}

#[test]
fn test_re_render_without_state_change_is_identical() {
    let fixture = Fixture::new();
    let spec = compile_path(vec![
        station("st1"),
        StationConfig {
            unlock_condition: "min_points:10".to_string(),
            ..station("st2")
        },
        StationConfig {
            unlock_trigger: "independent".to_string(),
            ..station("branch")
        },
    ]);
    fixture.ledger.set_points(STUDENT, 15).unwrap();
    fixture
        .engine
        .record_completion(STUDENT, find_station(&spec, "st1"), false, true, now())
        .unwrap();

    let first = fixture.engine.view_path(STUDENT, &spec).unwrap();
    let second = fixture.engine.view_path(STUDENT, &spec).unwrap();
    assert_eq!(first, second);
}
