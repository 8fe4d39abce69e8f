// growth-path-core/src/core/context.rs
// ============================================================================
// Module: Growth Path Viewing Context
// Description: Session principal and impersonation-aware viewing context.
// Purpose: Resolve who is really acting versus whose data is affected.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! Every request resolves a [`ViewingContext`]: the real acting identity and
//! the effective identity whose data is viewed or affected. Coach
//! impersonation swaps the session principal while keeping the original
//! actor in a server-side binding, so the context stays auditable. The
//! context is explicit state passed through the call chain, never ambient
//! globals, and the binding never outlives the session: login and logout of
//! either party clear it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Viewing Context
// ============================================================================

/// Resolved acting/effective identity pair for one request.
///
/// # Invariants
/// - `is_impersonating()` holds exactly when the real actor differs from the
///   effective user; the constructors make other states unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewingContext {
    /// Original acting identity, before any impersonation swap.
    real_actor: UserId,
    /// Identity whose data is viewed or affected.
    effective_user: UserId,
}

impl ViewingContext {
    /// Creates a context where the actor acts as themselves.
    #[must_use]
    pub const fn direct(user: UserId) -> Self {
        Self {
            real_actor: user,
            effective_user: user,
        }
    }

    /// Creates a context where `real_actor` acts with `effective_user`'s
    /// identity.
    #[must_use]
    pub const fn impersonated(real_actor: UserId, effective_user: UserId) -> Self {
        Self {
            real_actor,
            effective_user,
        }
    }

    /// Returns the original acting identity.
    #[must_use]
    pub const fn real_actor(&self) -> UserId {
        self.real_actor
    }

    /// Returns the identity whose data is viewed or affected.
    #[must_use]
    pub const fn effective_user(&self) -> UserId {
        self.effective_user
    }

    /// Returns `true` when the real actor differs from the effective user.
    #[must_use]
    pub fn is_impersonating(&self) -> bool {
        self.real_actor != self.effective_user
    }
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Server-side session state carrying the authenticated principal and the
/// impersonation binding.
///
/// The host owns session persistence (cookies, server-side stores); the
/// engine only manipulates this explicit value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Currently authenticated principal.
    authenticated: UserId,
    /// Original actor recorded while impersonating, if any.
    impersonator: Option<UserId>,
}

impl Session {
    /// Creates a session for an authenticated principal.
    #[must_use]
    pub const fn authenticated(user: UserId) -> Self {
        Self {
            authenticated: user,
            impersonator: None,
        }
    }

    /// Creates a session for an anonymous visitor.
    #[must_use]
    pub const fn guest() -> Self {
        Self::authenticated(UserId::GUEST)
    }

    /// Returns the currently authenticated principal.
    #[must_use]
    pub const fn principal(&self) -> UserId {
        self.authenticated
    }

    /// Returns the recorded impersonator, if the session is impersonating.
    #[must_use]
    pub const fn impersonator(&self) -> Option<UserId> {
        self.impersonator
    }

    /// Resolves the viewing context for this session.
    ///
    /// The effective identity is always the session principal; the real actor
    /// is the recorded impersonator when present.
    #[must_use]
    pub fn resolve_context(&self) -> ViewingContext {
        match self.impersonator {
            Some(real_actor) => ViewingContext::impersonated(real_actor, self.authenticated),
            None => ViewingContext::direct(self.authenticated),
        }
    }

    /// Re-authenticates the session as a new principal.
    ///
    /// Clears any impersonation binding so a stale binding can never leak
    /// across logins.
    pub fn login(&mut self, user: UserId) {
        self.authenticated = user;
        self.impersonator = None;
    }

    /// Logs the session out to the anonymous principal.
    ///
    /// Clears any impersonation binding.
    pub fn logout(&mut self) {
        self.authenticated = UserId::GUEST;
        self.impersonator = None;
    }

    /// Swaps the session principal to `target`, recording the current
    /// principal as the impersonator.
    ///
    /// Permission checking happens in the engine; this only mutates session
    /// state. Nested impersonation keeps the original actor.
    pub(crate) fn begin_impersonation(&mut self, target: UserId) {
        let original = self.impersonator.unwrap_or(self.authenticated);
        self.impersonator = Some(original);
        self.authenticated = target;
    }

    /// Restores the original principal and clears the binding.
    ///
    /// A no-op when the session is not impersonating.
    pub(crate) fn end_impersonation(&mut self) {
        if let Some(original) = self.impersonator.take() {
            self.authenticated = original;
        }
    }
}
