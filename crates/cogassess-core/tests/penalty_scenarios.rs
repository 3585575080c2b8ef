//! Budget selection across sequences of item results.

use proptest::prelude::*;

use cogassess_core::{BudgetKind, PenaltyEngine, PenaltyRule, Resolution};

fn first_try() -> Resolution {
    Resolution::Correct {
        incorrect_attempts: 0,
    }
}

fn retried(attempts: u32) -> Resolution {
    Resolution::Correct {
        incorrect_attempts: attempts,
    }
}

fn timed_out(attempts: u32) -> Resolution {
    Resolution::TimedOut {
        incorrect_attempts: attempts,
    }
}

/// Strategy: any resolution an item can end with.
fn resolution_strategy() -> impl Strategy<Value = Resolution> {
    prop_oneof![
        (0..4u32).prop_map(retried),
        (0..4u32).prop_map(timed_out),
    ]
}

#[test]
fn mixed_sequence_follows_previous_item() {
    let mut engine = PenaltyEngine::new(PenaltyRule::new(60, 50));
    assert_eq!(engine.initial_budget().secs, 60);

    assert_eq!(engine.resolve(first_try()).secs, 60);
    assert_eq!(engine.resolve(retried(1)).secs, 50);
    assert_eq!(engine.resolve(timed_out(0)).secs, 50);
    let budget = engine.resolve(first_try());
    assert_eq!(budget.secs, 60);
    assert_eq!(budget.kind, BudgetKind::Full);
    assert!(engine.recovered());
}

#[test]
fn consecutive_timeouts_stay_reduced() {
    let mut engine = PenaltyEngine::new(PenaltyRule::MATH);
    let first = engine.resolve(timed_out(0));
    let second = engine.resolve(timed_out(0));
    assert!(first.is_reduced());
    assert!(second.is_reduced());
    assert_eq!(second.secs, 50);
    assert!(!engine.recovered());
}

#[test]
fn retry_then_timeout_penalises_once() {
    let mut engine = PenaltyEngine::new(PenaltyRule::STROOP);
    let budget = engine.resolve(timed_out(2));
    assert_eq!(budget.secs, 10);
    assert_eq!(budget.label(), "Penalty Time");
}

proptest! {
    // The flag only ever reflects the most recent item.
    #[test]
    fn pending_penalty_tracks_last_item(seq in prop::collection::vec(resolution_strategy(), 1..40)) {
        let mut engine = PenaltyEngine::new(PenaltyRule::MATH);
        for resolution in &seq {
            let budget = engine.resolve(*resolution);
            prop_assert_eq!(engine.pending_penalty(), resolution.had_trouble());
            prop_assert_eq!(budget.is_reduced(), engine.pending_penalty());
        }
        let last = seq[seq.len() - 1];
        let expected = matches!(last, Resolution::TimedOut { .. })
            || last.incorrect_attempts() > 0;
        prop_assert_eq!(engine.pending_penalty(), expected);
    }

    // Budgets are always one of the rule's two values.
    #[test]
    fn budgets_come_from_rule(
        full in 2..120u32,
        cut in 1..60u32,
        seq in prop::collection::vec(resolution_strategy(), 0..20),
    ) {
        let reduced = full.saturating_sub(cut).max(1);
        let mut engine = PenaltyEngine::new(PenaltyRule::new(full, reduced));
        for resolution in seq {
            let secs = engine.resolve(resolution).secs;
            prop_assert!(secs == full || secs == reduced);
        }
    }
}
