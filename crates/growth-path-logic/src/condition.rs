// growth-path-logic/src/condition.rs
// ============================================================================
// Module: Condition Core Types
// Description: Boolean condition tree over typed predicates.
// Purpose: Define the `Condition` tree, its group node, and its evaluation
// walks. Dependencies: serde::{Deserialize, Serialize}, smallvec::SmallVec
// ============================================================================

//! ## Overview
//! This module defines the condition tree that powers unlock and gating
//! logic. Rather than separate and/or/threshold node types, every composite
//! is one [`ConditionGroup`]: a list of terms plus a [`GroupMode`] that says
//! how many of them must hold. `all` is a group requiring every term, `any`
//! a group requiring one, and explicit thresholds fall out of the same node.
//! A single evaluation loop therefore serves every combinator, and the
//! `Predicate` leaf is the boundary where domain semantics are injected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use smallvec::SmallVec;

use crate::traits::ConditionTrace;
use crate::traits::NoopTrace;
use crate::traits::PredicateEval;

// ============================================================================
// SECTION: Group Mode
// ============================================================================

/// How many of a group's terms must be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMode {
    /// Every term must hold. An empty group is trivially satisfied.
    All,
    /// At least one term must hold. An empty group is unsatisfiable.
    Any,
    /// At least this many terms must hold.
    AtLeast(u8),
}

impl GroupMode {
    /// Returns how many satisfied terms this mode requires of a group with
    /// `term_count` terms.
    #[must_use]
    pub const fn required(self, term_count: usize) -> usize {
        match self {
            Self::All => term_count,
            Self::Any => 1,
            Self::AtLeast(min) => min as usize,
        }
    }
}

// ============================================================================
// SECTION: Condition Tree
// ============================================================================

/// Term storage for a condition group.
///
/// Boxed because the tree is recursive; small groups stay inline.
type Terms<P> = SmallVec<[Box<Condition<P>>; 4]>;

/// A composite condition node: terms plus a satisfaction threshold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConditionGroup<P> {
    /// How many terms must be satisfied.
    pub mode: GroupMode,
    /// The terms of the group.
    pub terms: Terms<P>,
}

/// Boolean condition tree with domain-specific leaves.
///
/// Interior nodes are universal; the `Predicate` variant hands evaluation
/// off to the domain through [`PredicateEval`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition<P> {
    /// A group of terms combined under a satisfaction threshold.
    Group(ConditionGroup<P>),
    /// Inversion of the inner condition.
    Not(Box<Self>),
    /// Domain-specific atomic predicate.
    Predicate(P),
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

impl<P> ConditionGroup<P> {
    /// Evaluates this group with early exit in both directions.
    ///
    /// The walk stops as soon as the threshold is met, and as soon as the
    /// unevaluated remainder could no longer meet it.
    fn eval(&self, ctx: &P::Context<'_>) -> bool
    where
        P: PredicateEval,
    {
        let mut outstanding = self.mode.required(self.terms.len());
        for (index, term) in self.terms.iter().enumerate() {
            if outstanding == 0 {
                return true;
            }
            if self.terms.len() - index < outstanding {
                return false;
            }
            if term.eval(ctx) {
                outstanding -= 1;
            }
        }
        outstanding == 0
    }
}

impl<P> Condition<P> {
    /// Evaluates this condition, short-circuiting where possible.
    pub fn eval(&self, ctx: &P::Context<'_>) -> bool
    where
        P: PredicateEval,
    {
        match self {
            Self::Predicate(predicate) => predicate.eval(ctx),
            Self::Not(inner) => !inner.eval(ctx),
            Self::Group(group) => group.eval(ctx),
        }
    }

    /// Evaluates this condition while reporting every predicate leaf.
    ///
    /// Unlike [`Condition::eval`], this walk visits every leaf so the trace
    /// is complete; callers use it to explain an outcome to a user.
    pub fn eval_with_trace<T>(&self, ctx: &P::Context<'_>, trace: &mut T) -> bool
    where
        P: PredicateEval,
        T: ConditionTrace<P>,
    {
        match self {
            Self::Predicate(predicate) => {
                let result = predicate.eval(ctx);
                trace.on_predicate_evaluated(predicate, result);
                result
            }
            Self::Not(inner) => !inner.eval_with_trace(ctx, trace),
            Self::Group(group) => {
                let satisfied =
                    group.terms.iter().filter(|term| term.eval_with_trace(ctx, trace)).count();
                satisfied >= group.mode.required(group.terms.len())
            }
        }
    }

    /// Evaluates this condition discarding trace events.
    ///
    /// Helper kept for parity with [`Condition::eval_with_trace`] call sites
    /// that toggle tracing.
    pub fn eval_untraced(&self, ctx: &P::Context<'_>) -> bool
    where
        P: PredicateEval,
    {
        let mut trace = NoopTrace;
        self.eval_with_trace(ctx, &mut trace)
    }

    // ========================================================================
    // SECTION: Structural Analysis
    // ========================================================================

    /// Determines if this condition holds regardless of predicate answers.
    #[must_use]
    pub fn is_trivially_satisfied(&self) -> bool {
        match self {
            Self::Predicate(_) => false,
            Self::Not(inner) => inner.is_trivially_unsatisfiable(),
            Self::Group(group) => {
                let certain =
                    group.terms.iter().filter(|term| term.is_trivially_satisfied()).count();
                certain >= group.mode.required(group.terms.len())
            }
        }
    }

    /// Determines if this condition can never hold.
    #[must_use]
    pub fn is_trivially_unsatisfiable(&self) -> bool {
        match self {
            Self::Predicate(_) => false,
            Self::Not(inner) => inner.is_trivially_satisfied(),
            Self::Group(group) => {
                let impossible =
                    group.terms.iter().filter(|term| term.is_trivially_unsatisfiable()).count();
                group.terms.len() - impossible < group.mode.required(group.terms.len())
            }
        }
    }

    /// Returns the number of nodes in this condition tree.
    #[must_use]
    pub fn complexity(&self) -> usize {
        match self {
            Self::Predicate(_) => 1,
            Self::Not(inner) => 1 + inner.complexity(),
            Self::Group(group) => {
                1 + group.terms.iter().map(|term| term.complexity()).sum::<usize>()
            }
        }
    }

    /// Collects the unique predicate leaves referenced by this tree.
    pub fn predicates(&self) -> Vec<&P>
    where
        P: PartialEq,
    {
        let mut out = Vec::new();
        self.collect_predicates(&mut out);
        out
    }

    /// Walks the tree and appends unseen predicate leaves.
    fn collect_predicates<'a>(&'a self, out: &mut Vec<&'a P>)
    where
        P: PartialEq,
    {
        match self {
            Self::Predicate(predicate) => {
                if !out.contains(&predicate) {
                    out.push(predicate);
                }
            }
            Self::Not(inner) => inner.collect_predicates(out),
            Self::Group(group) => {
                for term in &group.terms {
                    term.collect_predicates(out);
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Constructor Helpers
// ============================================================================

impl<P> Condition<P> {
    /// Creates a group condition with an explicit mode.
    pub fn group(mode: GroupMode, conditions: Vec<Self>) -> Self {
        Self::Group(ConditionGroup {
            mode,
            terms: conditions.into_iter().map(Box::new).collect(),
        })
    }

    /// Creates a condition requiring all of the given conditions.
    pub fn all(conditions: Vec<Self>) -> Self {
        Self::group(GroupMode::All, conditions)
    }

    /// Creates a condition requiring any of the given conditions.
    pub fn any(conditions: Vec<Self>) -> Self {
        Self::group(GroupMode::Any, conditions)
    }

    /// Creates a condition requiring at least `min` of the given conditions.
    pub fn at_least(min: u8, conditions: Vec<Self>) -> Self {
        Self::group(GroupMode::AtLeast(min), conditions)
    }

    /// Creates a logical NOT of the given condition.
    pub fn negate(condition: Self) -> Self {
        Self::Not(Box::new(condition))
    }

    /// Creates a condition from a predicate.
    pub const fn predicate(predicate: P) -> Self {
        Self::Predicate(predicate)
    }
}

impl<P> std::ops::Not for Condition<P> {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

// ============================================================================
// SECTION: Default Implementation
// ============================================================================

impl<P> Default for Condition<P> {
    /// Creates an empty all-group (trivially satisfied).
    fn default() -> Self {
        Self::Group(ConditionGroup {
            mode: GroupMode::All,
            terms: SmallVec::new(),
        })
    }
}
