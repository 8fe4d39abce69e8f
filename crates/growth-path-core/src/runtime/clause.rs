// growth-path-core/src/runtime/clause.rs
// ============================================================================
// Module: Growth Path Clause Evaluation
// Description: Unlock clause evaluation against collaborator stores.
// Purpose: Bridge the condition algebra with flag, ledger, and metadata
// lookups. Dependencies: crate::{core, interfaces}, growth-path-logic, tracing
// ============================================================================

//! ## Overview
//! Clause evaluation resolves typed unlock predicates against the live
//! collaborator stores. Evaluation is read-only, idempotent, and fail-closed:
//! a collaborator failure or an unrecognized predicate key evaluates `false`
//! with a warning rather than opening a station by accident.

// ============================================================================
// SECTION: Imports
// ============================================================================

use growth_path_logic::Condition;
use growth_path_logic::PredicateEval;

use crate::core::condition::UnlockClause;
use crate::core::identifiers::UserId;
use crate::interfaces::FlagStore;
use crate::interfaces::MetadataStore;
use crate::interfaces::RewardsLedger;

// ============================================================================
// SECTION: Clause Reader
// ============================================================================

/// Borrowed evaluation context for unlock clauses.
///
/// Bundles the collaborator stores a clause may consult, scoped to one user.
pub struct ClauseReader<'a> {
    /// User the clauses are evaluated for.
    user: UserId,
    /// Flag store collaborator.
    flags: &'a dyn FlagStore,
    /// Rewards ledger collaborator.
    ledger: &'a dyn RewardsLedger,
    /// Metadata store collaborator.
    metadata: &'a dyn MetadataStore,
}

impl<'a> ClauseReader<'a> {
    /// Creates a clause reader scoped to one user.
    #[must_use]
    pub const fn new(
        user: UserId,
        flags: &'a dyn FlagStore,
        ledger: &'a dyn RewardsLedger,
        metadata: &'a dyn MetadataStore,
    ) -> Self {
        Self {
            user,
            flags,
            ledger,
            metadata,
        }
    }

    /// Returns the user the clauses are evaluated for.
    #[must_use]
    pub const fn user(&self) -> UserId {
        self.user
    }

    /// Evaluates a compiled unlock condition for this reader's user.
    #[must_use]
    pub fn conditions_met(&self, condition: &Condition<UnlockClause>) -> bool {
        condition.eval(self)
    }
}

// ============================================================================
// SECTION: Predicate Evaluation
// ============================================================================

impl PredicateEval for UnlockClause {
    type Context<'a> = ClauseReader<'a>;

    fn eval(&self, ctx: &Self::Context<'_>) -> bool {
        match self {
            Self::HasFlag {
                flag,
            } => ctx.flags.has_flag(ctx.user, flag).unwrap_or_else(|err| {
                tracing::warn!(user = %ctx.user, %flag, error = %err, "flag lookup failed; clause fails closed");
                false
            }),
            Self::LacksFlag {
                flag,
            } => ctx
                .flags
                .has_flag(ctx.user, flag)
                .map(|held| !held)
                .unwrap_or_else(|err| {
                    tracing::warn!(user = %ctx.user, %flag, error = %err, "flag lookup failed; clause fails closed");
                    false
                }),
            Self::HasBadge {
                badge,
            } => ctx.ledger.has_badge(ctx.user, badge).unwrap_or_else(|err| {
                tracing::warn!(user = %ctx.user, %badge, error = %err, "badge lookup failed; clause fails closed");
                false
            }),
            Self::MissingBadge {
                badge,
            } => ctx
                .ledger
                .has_badge(ctx.user, badge)
                .map(|held| !held)
                .unwrap_or_else(|err| {
                    tracing::warn!(user = %ctx.user, %badge, error = %err, "badge lookup failed; clause fails closed");
                    false
                }),
            Self::MinPoints {
                threshold,
            } => ctx
                .ledger
                .total_points(ctx.user)
                .map(|points| points >= *threshold)
                .unwrap_or_else(|err| {
                    tracing::warn!(user = %ctx.user, error = %err, "points lookup failed; clause fails closed");
                    false
                }),
            Self::MaxPoints {
                threshold,
            } => ctx
                .ledger
                .total_points(ctx.user)
                .map(|points| points <= *threshold)
                .unwrap_or_else(|err| {
                    tracing::warn!(user = %ctx.user, error = %err, "points lookup failed; clause fails closed");
                    false
                }),
            Self::UserLevel {
                level,
            } => ctx
                .ledger
                .level(ctx.user)
                .map(|info| info.is_some_and(|info| info.name == *level))
                .unwrap_or_else(|err| {
                    tracing::warn!(user = %ctx.user, error = %err, "level lookup failed; clause fails closed");
                    false
                }),
            Self::UserMeta {
                key,
                value,
            } => ctx
                .metadata
                .get(ctx.user, key)
                .map(|stored| stored.as_deref() == Some(value.as_str()))
                .unwrap_or_else(|err| {
                    tracing::warn!(user = %ctx.user, key = %key, error = %err, "metadata lookup failed; clause fails closed");
                    false
                }),
            Self::Unrecognized {
                key,
            } => {
                tracing::warn!(key = %key, "unrecognized unlock predicate; clause fails closed");
                false
            }
        }
    }
}
