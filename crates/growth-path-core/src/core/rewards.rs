// growth-path-core/src/core/rewards.rs
// ============================================================================
// Module: Growth Path Reward Actions
// Description: Typed reward actions and rewards-spec compilation.
// Purpose: Parse `type:value` reward pairs once into dispatchable actions.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Station definitions encode rewards as `type:value` pairs joined by `|`
//! (for example `add_points:50|award_badge:fast_learner`). Pairs are compiled
//! once into [`RewardAction`] values at path-compile time. Unrecognized
//! reward types compile into a skip-at-dispatch action so one bad pair never
//! blocks the rest of a station's rewards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::BadgeSlug;

// ============================================================================
// SECTION: Reward Actions
// ============================================================================

/// One dispatchable reward granted when a station completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardAction {
    /// Add points to the user's ledger balance.
    AddPoints {
        /// Number of points to add.
        amount: i64,
    },
    /// Award a named badge.
    AwardBadge {
        /// Badge to award.
        badge: BadgeSlug,
    },
    /// A reward type this engine does not recognize.
    ///
    /// Skipped at dispatch time with a warning.
    Unrecognized {
        /// The unrecognized reward type.
        key: String,
        /// The raw reward value.
        value: String,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Rewards-spec compilation errors.
#[derive(Debug, Error)]
pub enum RewardParseError {
    /// A pair segment is empty or missing its `type:value` separator.
    #[error("malformed reward pair: {0:?}")]
    MalformedPair(String),
    /// An `add_points` amount is not a valid integer.
    #[error("invalid points amount in reward pair {pair:?}")]
    InvalidAmount {
        /// The offending pair text.
        pair: String,
    },
}

// ============================================================================
// SECTION: Rewards-Spec Compilation
// ============================================================================

/// Compiles a rewards-spec string into typed reward actions.
///
/// An empty spec compiles to no actions.
///
/// # Errors
///
/// Returns [`RewardParseError`] for pairs without a `type:value` separator or
/// with a non-numeric points amount. Unrecognized reward types compile
/// successfully into [`RewardAction::Unrecognized`].
pub fn compile_rewards_spec(spec: &str) -> Result<Vec<RewardAction>, RewardParseError> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut actions = Vec::new();
    for segment in trimmed.split('|') {
        actions.push(parse_pair(segment)?);
    }
    Ok(actions)
}

/// Parses a single `type:value` pair into a reward action.
fn parse_pair(segment: &str) -> Result<RewardAction, RewardParseError> {
    let segment = segment.trim();
    let Some((key, value)) = segment.split_once(':') else {
        return Err(RewardParseError::MalformedPair(segment.to_string()));
    };
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return Err(RewardParseError::MalformedPair(segment.to_string()));
    }

    let action = match key {
        "add_points" => RewardAction::AddPoints {
            amount: value.parse().map_err(|_| RewardParseError::InvalidAmount {
                pair: segment.to_string(),
            })?,
        },
        "award_badge" => RewardAction::AwardBadge {
            badge: BadgeSlug::from(value),
        },
        other => RewardAction::Unrecognized {
            key: other.to_string(),
            value: value.to_string(),
        },
    };
    Ok(action)
}

// ============================================================================
// SECTION: Dispatch Summary
// ============================================================================

/// Outcome of dispatching one station's reward actions.
///
/// Dispatch is best-effort: every action is attempted and failures are
/// collected here instead of propagating, so a missing rewards backend never
/// blocks completion recording.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsSummary {
    /// Actions dispatched successfully.
    pub granted: Vec<RewardAction>,
    /// Actions skipped, with the reason each was skipped.
    pub skipped: Vec<RewardSkip>,
}

impl RewardsSummary {
    /// Returns `true` when no action was dispatched or skipped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.granted.is_empty() && self.skipped.is_empty()
    }
}

/// A reward action that was not dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSkip {
    /// The action that was skipped.
    pub action: RewardAction,
    /// Why the action was skipped.
    pub reason: String,
}
