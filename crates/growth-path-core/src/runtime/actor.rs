// growth-path-core/src/runtime/actor.rs
// ============================================================================
// Module: Growth Path Actor Gate
// Description: Actor-class permission decisions for mission submission.
// Purpose: Decide whether an acting identity may act on a target identity.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! The actor gate evaluates a per-station actor-class whitelist against the
//! acting and target identities. The admin capability bypasses the table;
//! otherwise rules are evaluated in a fixed order and the first match wins.
//! Deny decisions carry no reason so callers cannot turn the gate into a
//! user-enumeration oracle; the permit class is retained for audit logging.
//!
//! The same gate backs mission submission and impersonation start; the two
//! differ only in the whitelist they pass in.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::identifiers::ScopeId;
use crate::core::identifiers::UserId;
use crate::core::path::ActorClass;
use crate::interfaces::CoachDirectory;

// ============================================================================
// SECTION: Decisions
// ============================================================================

/// How a permitted actor matched the decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermitClass {
    /// Global admin capability bypassed the table.
    Admin,
    /// The target acting for themselves.
    SelfActor,
    /// The target's assigned coach.
    Coach,
    /// An anonymous visitor.
    Guest,
    /// Another authenticated user.
    OtherUser,
}

/// Outcome of an actor gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The actor may act on the target.
    Permit(PermitClass),
    /// The actor may not act on the target. No reason is disclosed.
    Deny,
}

impl GateDecision {
    /// Returns `true` when the decision permits the action.
    #[must_use]
    pub const fn is_permitted(&self) -> bool {
        matches!(self, Self::Permit(_))
    }
}

// ============================================================================
// SECTION: Gate Evaluation
// ============================================================================

/// Decides whether `actor` may act on behalf of `target`.
///
/// Evaluation order, first match wins:
/// 1. `actor` holds the global admin capability: always permitted.
/// 2. `actor == target`: permitted iff `self` is whitelisted.
/// 3. `actor` is the target's assigned coach: permitted iff `coach` is
///    whitelisted.
/// 4. `actor` is anonymous: permitted iff `guests` is whitelisted.
/// 5. `actor` is any other authenticated user: permitted iff `users` is
///    whitelisted.
///
/// Directory failures degrade: a failed admin or coach lookup is treated as
/// "no capability" with a warning, so an unavailable directory can narrow
/// but never widen access.
#[must_use]
pub fn check_actor(
    allowed: &[ActorClass],
    target: UserId,
    actor: UserId,
    scope: Option<&ScopeId>,
    directory: &dyn CoachDirectory,
) -> GateDecision {
    if is_admin(actor, directory) {
        return GateDecision::Permit(PermitClass::Admin);
    }

    if actor == target {
        return if allowed.contains(&ActorClass::TargetSelf) {
            GateDecision::Permit(PermitClass::SelfActor)
        } else {
            GateDecision::Deny
        };
    }

    if !actor.is_guest() && assigned_coach(target, scope, directory) == Some(actor) {
        return if allowed.contains(&ActorClass::Coach) {
            GateDecision::Permit(PermitClass::Coach)
        } else {
            GateDecision::Deny
        };
    }

    if actor.is_guest() {
        return if allowed.contains(&ActorClass::Guests) {
            GateDecision::Permit(PermitClass::Guest)
        } else {
            GateDecision::Deny
        };
    }

    if allowed.contains(&ActorClass::Users) {
        GateDecision::Permit(PermitClass::OtherUser)
    } else {
        GateDecision::Deny
    }
}

/// Looks up the admin capability, degrading to `false` on failure.
fn is_admin(actor: UserId, directory: &dyn CoachDirectory) -> bool {
    if actor.is_guest() {
        return false;
    }
    directory.is_admin(actor).unwrap_or_else(|err| {
        tracing::warn!(actor = %actor, error = %err, "admin lookup failed; treating as non-admin");
        false
    })
}

/// Looks up the assigned coach, degrading to `None` on failure.
fn assigned_coach(
    target: UserId,
    scope: Option<&ScopeId>,
    directory: &dyn CoachDirectory,
) -> Option<UserId> {
    directory.assigned_coach(target, scope).unwrap_or_else(|err| {
        tracing::warn!(target = %target, error = %err, "coach lookup failed; treating as unassigned");
        None
    })
}
