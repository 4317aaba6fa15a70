//! Property-based tests for the state machine
//!
//! These tests verify the legal-transition graph holds across all inputs.

use super::transition::*;
use super::*;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_state() -> impl Strategy<Value = SessionState> {
    prop::sample::select(SessionState::ALL.to_vec())
}

fn arb_resting_state() -> impl Strategy<Value = SessionState> {
    prop_oneof![
        Just(SessionState::NotInSession),
        Just(SessionState::InSession),
        Just(SessionState::Joined),
    ]
}

fn arb_in_progress_state() -> impl Strategy<Value = SessionState> {
    prop_oneof![
        Just(SessionState::Entering),
        Just(SessionState::Joining),
        Just(SessionState::Leaving),
        Just(SessionState::ExitingSession),
    ]
}

fn arb_transition() -> impl Strategy<Value = TransitionKind> {
    prop::sample::select(TransitionKind::ALL.to_vec())
}

/// The graph written out edge by edge
fn is_legal_edge(state: SessionState, kind: TransitionKind) -> bool {
    matches!(
        (state, kind),
        (SessionState::NotInSession, TransitionKind::Enter)
            | (SessionState::InSession, TransitionKind::Quit | TransitionKind::Join)
            | (SessionState::Joined, TransitionKind::Leave)
    )
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_accepted_iff_legal_edge(state in arb_state(), kind in arb_transition()) {
        prop_assert_eq!(begin(state, kind).is_ok(), is_legal_edge(state, kind));
        prop_assert_eq!(guard(kind, state), is_legal_edge(state, kind));
    }

    #[test]
    fn prop_in_progress_states_reject_everything(
        state in arb_in_progress_state(),
        kind in arb_transition(),
    ) {
        let rejected = matches!(
            begin(state, kind),
            Err(TransitionError::Rejected { transition, state: s }) if transition == kind && s == state
        );
        prop_assert!(rejected);
    }

    #[test]
    fn prop_accepted_transitions_land_in_resting_states(
        state in arb_resting_state(),
        kind in arb_transition(),
    ) {
        if let Ok(in_progress) = begin(state, kind) {
            prop_assert!(in_progress.is_in_progress());
            prop_assert!(!kind.settled_state().is_in_progress());
        }
    }

    #[test]
    fn prop_walk_never_leaves_graph(kinds in proptest::collection::vec(arb_transition(), 0..40)) {
        // Replay a random request sequence with instant settlement
        let mut state = SessionState::NotInSession;
        for kind in kinds {
            let before = state;
            match begin(state, kind) {
                Ok(_) => state = kind.settled_state(),
                Err(_) => prop_assert_eq!(state, before),
            }
            prop_assert!(!state.is_in_progress());
        }
    }
}
