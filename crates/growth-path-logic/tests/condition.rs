// growth-path-logic/tests/condition.rs
// ============================================================================
// Module: Condition Tree Tests
// Description: Validate combinator semantics and traced evaluation.
// ============================================================================
//! ## Overview
//! Exercises the boolean algebra against a minimal set-membership domain.

#![allow(
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items,
    reason = "Tests use unwrap on deterministic fixtures."
)]

use std::collections::BTreeSet;

use growth_path_logic::Condition;
use growth_path_logic::ConditionTrace;
use growth_path_logic::GroupMode;
use growth_path_logic::PredicateEval;
use growth_path_logic::convenience;

// ============================================================================
// SECTION: Test Domain
// ============================================================================

/// Predicate satisfied when its key is present in the context set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HasKey(&'static str);

/// Evaluation context holding the set of held keys.
struct KeySet {
    held: BTreeSet<&'static str>,
}

impl KeySet {
    fn of(keys: &[&'static str]) -> Self {
        Self {
            held: keys.iter().copied().collect(),
        }
    }
}

impl PredicateEval for HasKey {
    type Context<'a> = KeySet;

    fn eval(&self, ctx: &Self::Context<'_>) -> bool {
        ctx.held.contains(self.0)
    }
}

/// Trace collector recording evaluated leaves in order.
#[derive(Default)]
struct Recorder {
    events: Vec<(&'static str, bool)>,
}

impl ConditionTrace<HasKey> for Recorder {
    fn on_predicate_evaluated(&mut self, predicate: &HasKey, result: bool) {
        self.events.push((predicate.0, result));
    }
}

// ============================================================================
// SECTION: Combinator Semantics
// ============================================================================

#[test]
fn test_all_requires_every_term() {
    let cond = convenience::all(vec![
        Condition::predicate(HasKey("a")),
        Condition::predicate(HasKey("b")),
    ]);

    assert!(cond.eval(&KeySet::of(&["a", "b"])));
    assert!(!cond.eval(&KeySet::of(&["a"])));
    assert!(!cond.eval(&KeySet::of(&[])));
}

#[test]
fn test_any_requires_one_term() {
    let cond = convenience::any(vec![
        Condition::predicate(HasKey("a")),
        Condition::predicate(HasKey("b")),
    ]);

    assert!(cond.eval(&KeySet::of(&["b"])));
    assert!(cond.eval(&KeySet::of(&["a", "b"])));
    assert!(!cond.eval(&KeySet::of(&["c"])));
}

#[test]
fn test_empty_all_is_trivially_true() {
    let cond: Condition<HasKey> = Condition::default();
    assert!(cond.eval(&KeySet::of(&[])));
    assert!(cond.is_trivially_satisfied());
}

#[test]
fn test_empty_any_is_trivially_false() {
    let cond: Condition<HasKey> = Condition::any(vec![]);
    assert!(!cond.eval(&KeySet::of(&["a"])));
    assert!(cond.is_trivially_unsatisfiable());
}

#[test]
fn test_not_inverts() {
    let cond = !Condition::predicate(HasKey("a"));
    assert!(!cond.eval(&KeySet::of(&["a"])));
    assert!(cond.eval(&KeySet::of(&[])));
}

#[test]
fn test_at_least_threshold() {
    let cond = convenience::at_least(2, vec![
        Condition::predicate(HasKey("a")),
        Condition::predicate(HasKey("b")),
        Condition::predicate(HasKey("c")),
    ]);

    assert!(!cond.eval(&KeySet::of(&["a"])));
    assert!(cond.eval(&KeySet::of(&["a", "c"])));
    assert!(cond.eval(&KeySet::of(&["a", "b", "c"])));
}

#[test]
fn test_at_least_zero_is_trivially_true() {
    let cond = convenience::at_least(0, vec![Condition::predicate(HasKey("a"))]);
    assert!(cond.eval(&KeySet::of(&[])));
    assert!(cond.is_trivially_satisfied());
}

#[test]
fn test_at_least_exceeding_terms_is_unsatisfiable() {
    let cond = convenience::at_least(3, vec![
        Condition::predicate(HasKey("a")),
        Condition::predicate(HasKey("b")),
    ]);
    assert!(!cond.eval(&KeySet::of(&["a", "b"])));
    assert!(cond.is_trivially_unsatisfiable());
}

#[test]
fn test_nested_composition() {
    // a AND (b OR NOT c)
    let cond = convenience::all(vec![
        Condition::predicate(HasKey("a")),
        convenience::any(vec![
            Condition::predicate(HasKey("b")),
            convenience::not(Condition::predicate(HasKey("c"))),
        ]),
    ]);

    assert!(cond.eval(&KeySet::of(&["a", "b", "c"])));
    assert!(cond.eval(&KeySet::of(&["a"])));
    assert!(!cond.eval(&KeySet::of(&["a", "c"])));
    assert!(!cond.eval(&KeySet::of(&["b"])));
}

// ============================================================================
// SECTION: Traced Evaluation
// ============================================================================

#[test]
fn test_trace_visits_every_leaf() {
    let cond = convenience::all(vec![
        Condition::predicate(HasKey("a")),
        Condition::predicate(HasKey("b")),
        Condition::predicate(HasKey("c")),
    ]);

    let mut trace = Recorder::default();
    let result = cond.eval_with_trace(&KeySet::of(&["b"]), &mut trace);

    assert!(!result);
    assert_eq!(trace.events, vec![("a", false), ("b", true), ("c", false)]);
}

#[test]
fn test_traced_and_untraced_agree() {
    let cond = convenience::any(vec![
        convenience::all(vec![
            Condition::predicate(HasKey("a")),
            Condition::predicate(HasKey("b")),
        ]),
        Condition::predicate(HasKey("c")),
    ]);

    for keys in [&["a"][..], &["a", "b"][..], &["c"][..], &[][..]] {
        let ctx = KeySet::of(keys);
        assert_eq!(cond.eval(&ctx), cond.eval_untraced(&ctx));
    }
}

// ============================================================================
// SECTION: Structure Helpers
// ============================================================================

#[test]
fn test_predicates_are_deduplicated() {
    let cond = convenience::all(vec![
        Condition::predicate(HasKey("a")),
        convenience::any(vec![
            Condition::predicate(HasKey("a")),
            Condition::predicate(HasKey("b")),
        ]),
    ]);

    let leaves = cond.predicates();
    assert_eq!(leaves.len(), 2);
}

#[test]
fn test_complexity_counts_nodes() {
    let cond = convenience::all(vec![
        Condition::predicate(HasKey("a")),
        convenience::not(Condition::predicate(HasKey("b"))),
    ]);
    // group node + leaf + not node + leaf
    assert_eq!(cond.complexity(), 4);
}

#[test]
fn test_group_mode_thresholds() {
    assert_eq!(GroupMode::All.required(3), 3);
    assert_eq!(GroupMode::Any.required(3), 1);
    assert_eq!(GroupMode::AtLeast(2).required(3), 2);

    // An explicit group behaves like its convenience counterpart.
    let explicit = Condition::group(GroupMode::Any, vec![
        Condition::predicate(HasKey("a")),
        Condition::predicate(HasKey("b")),
    ]);
    let shorthand = convenience::any(vec![
        Condition::predicate(HasKey("a")),
        Condition::predicate(HasKey("b")),
    ]);
    assert_eq!(explicit, shorthand);
}

#[test]
fn test_serde_round_trip() {
    let cond: Condition<String> = convenience::at_least(1, vec![
        Condition::predicate("a".to_string()),
        convenience::not(Condition::predicate("b".to_string())),
    ]);

    let json = serde_json::to_string(&cond).unwrap();
    let back: Condition<String> = serde_json::from_str(&json).unwrap();
    assert_eq!(cond, back);
}
