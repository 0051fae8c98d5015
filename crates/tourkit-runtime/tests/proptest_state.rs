//! Property tests for the tour state machine and the engine built on it.

use proptest::prelude::*;
use tourkit_core::{Rect, TourStep};
use tourkit_harness::ScriptedPlatform;
use tourkit_runtime::{TourEngine, TourRunState, Transition};

#[derive(Debug, Clone)]
enum Op {
    Start(usize),
    Next,
    Prev,
    GoTo(usize),
    End,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..5).prop_map(Op::Start),
        Just(Op::Next),
        Just(Op::Prev),
        (0usize..8).prop_map(Op::GoTo),
        Just(Op::End),
    ]
}

fn steps(n: usize) -> Vec<TourStep<String>> {
    (0..n)
        .map(|i| TourStep::new(format!("#s{i}").as_str(), format!("Step {i}"), ""))
        .collect()
}

fn assert_consistent(state: &TourRunState<String>) {
    if state.is_active() {
        assert!(state.current_step_index() < state.steps().len());
        assert!(state.current_step().is_some());
    } else {
        assert!(state.steps().is_empty());
        assert_eq!(state.tour_id(), None);
        assert_eq!(state.current_step_index(), 0);
        assert!(state.current_step().is_none());
    }
}

proptest! {
    #[test]
    fn state_invariants_hold(ops in proptest::collection::vec(op(), 0..40)) {
        let mut state = TourRunState::new();
        for op in ops {
            let was_active = state.is_active();
            let before = state.current_step_index();
            let transition = match op {
                Op::Start(n) => state.start(steps(n), Some(format!("tour-{n}"))),
                Op::Next => state.next(),
                Op::Prev => state.prev(),
                Op::GoTo(i) => state.go_to(i),
                Op::End => state.end(),
            };
            match transition {
                Transition::Unchanged => {
                    prop_assert_eq!(state.is_active(), was_active);
                    prop_assert_eq!(state.current_step_index(), before);
                }
                Transition::Step(index) => {
                    prop_assert!(state.is_active());
                    prop_assert_eq!(state.current_step_index(), index);
                    prop_assert!(state.highlight_rect.is_none());
                    prop_assert!(!state.is_positioned);
                }
                Transition::Ended(id) => {
                    prop_assert!(was_active);
                    prop_assert!(id.is_some());
                }
            }
            assert_consistent(&state);
        }
    }

    #[test]
    fn end_fires_only_from_active(ops in proptest::collection::vec(op(), 0..20)) {
        let mut state: TourRunState<String> = TourRunState::new();
        for op in ops {
            let was_active = state.is_active();
            let transition = match op {
                Op::Start(n) => state.start(steps(n), None),
                Op::Next => state.next(),
                Op::Prev => state.prev(),
                Op::GoTo(i) => state.go_to(i),
                Op::End => state.end(),
            };
            if !was_active {
                prop_assert!(!matches!(transition, Transition::Ended(_)));
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn engine_settles_on_a_positioned_step(ops in proptest::collection::vec(op(), 1..12)) {
        let platform = ScriptedPlatform::new();
        for i in 0..5 {
            platform.place(format!("#s{i}"), Rect::new(40.0 * i as f64, 300.0, 120.0, 40.0));
        }
        let engine = TourEngine::new(platform.clone());
        for op in ops {
            match op {
                Op::Start(n) => engine.start_tour(steps(n), None),
                Op::Next => engine.next_step(),
                Op::Prev => engine.prev_step(),
                Op::GoTo(i) => engine.go_to_step(i),
                Op::End => engine.end_tour(),
            }
            platform.run_until_stalled();
        }
        prop_assert!(platform.settle());

        let view = engine.snapshot();
        if view.is_active {
            prop_assert!(view.is_positioned);
            let expected = Rect::new(40.0 * view.current_step_index as f64, 300.0, 120.0, 40.0);
            prop_assert_eq!(view.highlight_rect, Some(expected));
            prop_assert_eq!(platform.keyboard_subscribers(), 1);
        } else {
            prop_assert_eq!(platform.keyboard_subscribers(), 0);
            prop_assert_eq!(platform.scheduler().pending_frames(), 0);
        }
        engine.end_tour();
    }
}
