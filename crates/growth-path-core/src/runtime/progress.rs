// growth-path-core/src/runtime/progress.rs
// ============================================================================
// Module: Growth Path Progress Derivation
// Description: Station status calculation and path processing.
// Purpose: Derive locked/open/completed states from persisted evidence.
// Dependencies: crate::{core, interfaces, runtime::clause}
// ============================================================================

//! ## Overview
//! Status derivation is pure with respect to persisted state: given the same
//! completion records, flags, and ledger values, it always produces the same
//! station states. Nothing here writes; nothing here caches. Each render
//! recomputes from scratch because flags and points can change between
//! requests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::identifiers::UserId;
use crate::core::path::PathSpec;
use crate::core::path::StationSpec;
use crate::core::path::UnlockTrigger;
use crate::core::records::PathProgress;
use crate::core::records::PathView;
use crate::core::records::StationState;
use crate::core::records::StationStatus;
use crate::interfaces::FlagStore;
use crate::interfaces::ProgressStore;
use crate::runtime::clause::ClauseReader;
use crate::runtime::engine::EngineError;

// ============================================================================
// SECTION: Status Evaluator
// ============================================================================

/// Derives station states from persisted evidence and unlock rules.
pub struct StatusEvaluator<'a> {
    /// Progress store holding completion records.
    progress: &'a dyn ProgressStore,
    /// Flag store consulted for legacy evidence and visibility.
    flags: &'a dyn FlagStore,
    /// Clause reader for unlock condition evaluation.
    clauses: ClauseReader<'a>,
}

impl<'a> StatusEvaluator<'a> {
    /// Creates a status evaluator over the given collaborators.
    #[must_use]
    pub const fn new(
        progress: &'a dyn ProgressStore,
        flags: &'a dyn FlagStore,
        clauses: ClauseReader<'a>,
    ) -> Self {
        Self {
            progress,
            flags,
            clauses,
        }
    }

    /// Computes the derived status for one station.
    ///
    /// `previous_completed` carries the sequential-chain state threaded by
    /// the path processor; independent stations ignore it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when completion or flag storage fails.
    pub fn station_status(
        &self,
        user: UserId,
        station: &StationSpec,
        previous_completed: bool,
    ) -> Result<StationState, EngineError> {
        if self.is_completed(user, station)? {
            return Ok(StationState {
                node_id: station.node_id.clone(),
                status: StationStatus::Completed,
            });
        }

        let ready_by_sequence =
            station.unlock_trigger == UnlockTrigger::Independent || previous_completed;
        let conditions_met = self.clauses.conditions_met(&station.unlock_condition);

        let status = if ready_by_sequence && conditions_met {
            StationStatus::Open
        } else {
            StationStatus::Locked
        };
        Ok(StationState {
            node_id: station.node_id.clone(),
            status,
        })
    }

    /// Returns whether completion evidence exists for the station.
    ///
    /// A durable completion record always counts. For legacy flag-evidence
    /// mission kinds, a set flag named by the mission target also counts;
    /// newer kinds never consult the flag fallback.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when completion or flag storage fails.
    pub fn is_completed(&self, user: UserId, station: &StationSpec) -> Result<bool, EngineError> {
        if self.progress.has_completion(user, &station.node_id)? {
            return Ok(true);
        }
        if let Some(flag) = station.evidence_flag() {
            return Ok(self.flags.has_flag(user, &flag)?);
        }
        Ok(false)
    }

    /// Processes a full path for a user, in authored order.
    ///
    /// Threads the sequential-chain state across stations: sequential
    /// stations update it with their own completion, independent stations
    /// leave it untouched. Visibility filtering happens after status
    /// computation, so a hidden station still participates in the sequential
    /// chain; only its rendering is suppressed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when completion or flag storage fails.
    pub fn process_path(&self, user: UserId, spec: &PathSpec) -> Result<PathView, EngineError> {
        let mut previous_completed = true;
        let mut stations = Vec::with_capacity(spec.stations.len());
        let mut completed = 0u32;
        let mut total_visible = 0u32;

        for station in &spec.stations {
            let state = self.station_status(user, station, previous_completed)?;

            if station.unlock_trigger == UnlockTrigger::Sequential {
                previous_completed = state.is_completed();
            }

            if self.is_visible(user, station)? {
                total_visible += 1;
                if state.is_completed() {
                    completed += 1;
                }
                stations.push(state);
            }
        }

        Ok(PathView {
            instance_id: spec.instance_id.clone(),
            stations,
            progress: PathProgress {
                completed,
                total_visible,
            },
        })
    }

    /// Returns whether the station is visible to the user.
    fn is_visible(&self, user: UserId, station: &StationSpec) -> Result<bool, EngineError> {
        match &station.visibility_flag {
            Some(flag) => Ok(self.flags.has_flag(user, flag)?),
            None => Ok(true),
        }
    }
}
