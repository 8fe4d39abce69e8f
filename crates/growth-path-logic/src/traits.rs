// growth-path-logic/src/traits.rs
// ============================================================================
// Module: Condition Evaluation Traits
// Description: Evaluation and trace contracts for condition trees.
// Purpose: Define how domain predicates evaluate against a domain context.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Evaluation contracts describe how predicate leaves resolve against a
//! domain-supplied context. The context type is chosen by the domain via a
//! generic associated type, so the algebra stays free of domain knowledge.

// ============================================================================
// SECTION: Predicate Evaluation
// ============================================================================

/// Core trait for evaluating a domain predicate against a context.
///
/// The context bundles whatever borrowed state the domain needs to answer a
/// predicate: lookup tables, per-user stores, or precomputed snapshots.
/// Implementations must be pure with respect to the context; repeated
/// evaluation against the same context must yield the same result.
pub trait PredicateEval {
    /// Domain-specific context borrowed for the duration of an evaluation.
    type Context<'a>;

    /// Evaluates this predicate against the given context.
    ///
    /// Returns `true` when the predicate is satisfied. Implementations that
    /// cannot resolve a predicate (missing data, failed lookup) must fail
    /// closed and return `false`.
    fn eval(&self, ctx: &Self::Context<'_>) -> bool;
}

// ============================================================================
// SECTION: Evaluation Trace
// ============================================================================

/// Trace hook invoked for every predicate leaf evaluated in a tree walk.
///
/// Traces let callers explain an outcome (which clauses held, which did not)
/// without re-running the evaluation.
pub trait ConditionTrace<P> {
    /// Called after a predicate leaf has been evaluated.
    fn on_predicate_evaluated(&mut self, predicate: &P, result: bool);
}

/// Trace implementation that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTrace;

impl<P> ConditionTrace<P> for NoopTrace {
    fn on_predicate_evaluated(&mut self, _predicate: &P, _result: bool) {}
}
