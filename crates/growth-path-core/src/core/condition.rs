// growth-path-core/src/core/condition.rs
// ============================================================================
// Module: Growth Path Unlock Clauses
// Description: Typed unlock predicates and expression compilation.
// Purpose: Parse string-encoded unlock expressions once into condition trees.
// Dependencies: growth-path-logic, serde, thiserror
// ============================================================================

//! ## Overview
//! Unlock rules arrive from the host as `key:value` clauses joined by `|`,
//! combined under an `and`/`or` relation. Expressions are compiled exactly
//! once, at path-compile time, into a [`Condition`] tree over typed
//! [`UnlockClause`] leaves; evaluation never re-parses strings.
//!
//! Unrecognized predicate keys are not a compile error: they produce a
//! fail-closed leaf that always evaluates `false`, so a typo in a definition
//! locks a station instead of silently opening it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use growth_path_logic::Condition;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::BadgeSlug;
use crate::core::identifiers::FlagName;

// ============================================================================
// SECTION: Clause Relation
// ============================================================================

/// Combinator applied across the clauses of an unlock expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionRelation {
    /// All clauses must hold.
    All,
    /// At least one clause must hold.
    Any,
}

impl ConditionRelation {
    /// Parses a relation attribute string (`and` / `or`).
    ///
    /// # Errors
    ///
    /// Returns [`ConditionParseError::UnknownRelation`] for any other value.
    pub fn parse(value: &str) -> Result<Self, ConditionParseError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "and" => Ok(Self::All),
            "or" => Ok(Self::Any),
            other => Err(ConditionParseError::UnknownRelation(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Unlock Clauses
// ============================================================================

/// One typed predicate of an unlock expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnlockClause {
    /// The user holds the named flag.
    HasFlag {
        /// Flag that must be set.
        flag: FlagName,
    },
    /// The user does not hold the named flag.
    LacksFlag {
        /// Flag that must be absent.
        flag: FlagName,
    },
    /// The user owns the named badge.
    HasBadge {
        /// Badge that must be owned.
        badge: BadgeSlug,
    },
    /// The user does not own the named badge.
    MissingBadge {
        /// Badge that must be absent.
        badge: BadgeSlug,
    },
    /// The user's total points meet a minimum threshold.
    MinPoints {
        /// Inclusive minimum point total.
        threshold: i64,
    },
    /// The user's total points do not exceed a maximum threshold.
    MaxPoints {
        /// Inclusive maximum point total.
        threshold: i64,
    },
    /// The user's current level carries the given name.
    UserLevel {
        /// Required level name.
        level: String,
    },
    /// A per-user metadata entry equals the given value.
    UserMeta {
        /// Metadata key to look up.
        key: String,
        /// Expected metadata value.
        value: String,
    },
    /// A predicate key this engine does not recognize.
    ///
    /// Always evaluates `false` (fail-closed) and warns at evaluation time.
    Unrecognized {
        /// The unrecognized predicate key.
        key: String,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Unlock expression compilation errors.
#[derive(Debug, Error)]
pub enum ConditionParseError {
    /// A clause segment is empty or missing its `key:value` separator.
    #[error("malformed unlock clause: {0:?}")]
    MalformedClause(String),
    /// A points threshold is not a valid integer.
    #[error("invalid points threshold in clause {clause:?}")]
    InvalidThreshold {
        /// The offending clause text.
        clause: String,
    },
    /// A `user_meta_key` clause has no companion metadata value.
    #[error("user_meta_key clause {key:?} has no companion meta value")]
    MissingMetaValue {
        /// The metadata key named by the clause.
        key: String,
    },
    /// The relation attribute is neither `and` nor `or`.
    #[error("unknown condition relation: {0:?}")]
    UnknownRelation(String),
}

// ============================================================================
// SECTION: Expression Compilation
// ============================================================================

/// Compiles an unlock expression into a condition tree.
///
/// `expression` is `clause1|clause2|...` with each clause `key:value`. An
/// empty expression compiles to the trivially satisfied empty tree (no
/// gating). `meta_value` is the companion value consumed by `user_meta_key`
/// clauses.
///
/// # Errors
///
/// Returns [`ConditionParseError`] for malformed clauses, non-numeric point
/// thresholds, an unknown relation, or a `user_meta_key` clause without its
/// companion value. Unrecognized predicate keys compile successfully into
/// fail-closed [`UnlockClause::Unrecognized`] leaves.
pub fn compile_expression(
    expression: &str,
    relation: ConditionRelation,
    meta_value: Option<&str>,
) -> Result<Condition<UnlockClause>, ConditionParseError> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Ok(Condition::default());
    }

    let mut clauses = Vec::new();
    for segment in trimmed.split('|') {
        clauses.push(Condition::predicate(parse_clause(segment, meta_value)?));
    }

    Ok(match relation {
        ConditionRelation::All => Condition::all(clauses),
        ConditionRelation::Any => Condition::any(clauses),
    })
}

/// Parses a single `key:value` clause into a typed predicate.
fn parse_clause(
    segment: &str,
    meta_value: Option<&str>,
) -> Result<UnlockClause, ConditionParseError> {
    let segment = segment.trim();
    let Some((key, value)) = segment.split_once(':') else {
        return Err(ConditionParseError::MalformedClause(segment.to_string()));
    };
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return Err(ConditionParseError::MalformedClause(segment.to_string()));
    }

    let clause = match key {
        "has_flag" => UnlockClause::HasFlag {
            flag: FlagName::from(value),
        },
        "has_not_flag" => UnlockClause::LacksFlag {
            flag: FlagName::from(value),
        },
        "has_badge" => UnlockClause::HasBadge {
            badge: BadgeSlug::from(value),
        },
        "missing_badge" => UnlockClause::MissingBadge {
            badge: BadgeSlug::from(value),
        },
        "min_points" => UnlockClause::MinPoints {
            threshold: parse_threshold(segment, value)?,
        },
        "max_points" => UnlockClause::MaxPoints {
            threshold: parse_threshold(segment, value)?,
        },
        "user_level" => UnlockClause::UserLevel {
            level: value.to_string(),
        },
        "user_meta_key" => {
            let companion =
                meta_value.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(|| {
                    ConditionParseError::MissingMetaValue {
                        key: value.to_string(),
                    }
                })?;
            UnlockClause::UserMeta {
                key: value.to_string(),
                value: companion.to_string(),
            }
        }
        other => UnlockClause::Unrecognized {
            key: other.to_string(),
        },
    };
    Ok(clause)
}

/// Parses a signed integer points threshold.
fn parse_threshold(segment: &str, value: &str) -> Result<i64, ConditionParseError> {
    value.parse().map_err(|_| ConditionParseError::InvalidThreshold {
        clause: segment.to_string(),
    })
}
