// growth-path-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Fixtures
// Description: Shared engine fixtures and spec builders for core tests.
// ============================================================================
//! ## Overview
//! Builds a path engine over in-memory collaborators, keeping clones of the
//! shared-state stores so tests can seed and inspect them directly.

#![allow(dead_code, reason = "Each integration test uses a subset of the fixture helpers.")]
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use growth_path_core::InMemoryCoachDirectory;
use growth_path_core::InMemoryFlagStore;
use growth_path_core::InMemoryMetadataStore;
use growth_path_core::InMemoryProgressStore;
use growth_path_core::InMemoryRewardsLedger;
use growth_path_core::PathConfig;
use growth_path_core::PathEngine;
use growth_path_core::PathSpec;
use growth_path_core::RecordingNotifier;
use growth_path_core::StationConfig;
use growth_path_core::StationSpec;
use growth_path_core::Timestamp;
use growth_path_core::UserId;

/// Engine type used across the core tests.
pub type TestEngine = PathEngine<
    InMemoryFlagStore,
    InMemoryRewardsLedger,
    InMemoryMetadataStore,
    InMemoryCoachDirectory,
    InMemoryProgressStore,
    RecordingNotifier,
>;

/// Engine plus handles to its shared-state collaborators.
pub struct Fixture {
    /// Engine under test.
    pub engine: TestEngine,
    /// Flag store handle.
    pub flags: InMemoryFlagStore,
    /// Rewards ledger handle.
    pub ledger: InMemoryRewardsLedger,
    /// Metadata store handle.
    pub metadata: InMemoryMetadataStore,
    /// Coach directory handle.
    pub coaches: InMemoryCoachDirectory,
    /// Progress store handle.
    pub progress: InMemoryProgressStore,
    /// Notifier handle.
    pub notifier: RecordingNotifier,
}

impl Fixture {
    /// Builds an engine over fresh in-memory collaborators.
    pub fn new() -> Self {
        let flags = InMemoryFlagStore::new();
        let ledger = InMemoryRewardsLedger::new();
        let metadata = InMemoryMetadataStore::new();
        let coaches = InMemoryCoachDirectory::new();
        let progress = InMemoryProgressStore::new();
        let notifier = RecordingNotifier::new();
        let engine = PathEngine::new(
            flags.clone(),
            ledger.clone(),
            metadata.clone(),
            coaches.clone(),
            progress.clone(),
            notifier.clone(),
        );
        Self {
            engine,
            flags,
            ledger,
            metadata,
            coaches,
            progress,
            notifier,
        }
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed timestamp used by tests that do not care about time.
pub fn now() -> Timestamp {
    Timestamp::from_unix_millis(1_700_000_000_000)
}

/// Student user used across tests.
pub const STUDENT: UserId = UserId::new(11);
/// Coach user used across tests.
pub const COACH: UserId = UserId::new(42);
/// Unrelated authenticated user used across tests.
pub const STRANGER: UserId = UserId::new(99);
/// Admin user used across tests.
pub const ADMIN: UserId = UserId::new(7);

/// Returns a minimal station configuration with the given identifier.
pub fn station(node_id: &str) -> StationConfig {
    StationConfig {
        node_id: Some(node_id.to_string()),
        title: format!("Station {node_id}"),
        ..StationConfig::default()
    }
}

/// Compiles a path from station configurations.
pub fn compile_path(stations: Vec<StationConfig>) -> PathSpec {
    PathSpec::compile(&PathConfig {
        title: "Growth Path".to_string(),
        display_mode: String::new(),
        stations,
    })
    .unwrap()
}

/// Returns the station spec with the given identifier.
pub fn find_station<'a>(spec: &'a PathSpec, node_id: &str) -> &'a StationSpec {
    spec.stations
        .iter()
        .find(|station| station.node_id.as_str() == node_id)
        .unwrap_or_else(|| panic!("station {node_id} not found"))
}
