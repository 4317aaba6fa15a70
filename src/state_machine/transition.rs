//! Pure transition table
//!
//! Encodes the legal-transition graph. Given the same state and transition it
//! always yields the same answer, with no side effects.

use super::{SessionState, TransitionKind};
use thiserror::Error;

/// Errors that can occur when requesting a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Transition '{transition}' is not allowed from state {state}")]
    Rejected {
        transition: TransitionKind,
        state: SessionState,
    },
}

/// Check whether `transition` may start from `state`
#[must_use]
pub fn guard(transition: TransitionKind, state: SessionState) -> bool {
    state == transition.required_state()
}

/// Accept or reject a transition request
///
/// On success returns the in-progress state to publish immediately.
pub fn begin(
    state: SessionState,
    transition: TransitionKind,
) -> Result<SessionState, TransitionError> {
    match (state, transition) {
        (SessionState::NotInSession, TransitionKind::Enter) => Ok(SessionState::Entering),
        (SessionState::InSession, TransitionKind::Quit) => Ok(SessionState::ExitingSession),
        (SessionState::InSession, TransitionKind::Join) => Ok(SessionState::Joining),
        (SessionState::Joined, TransitionKind::Leave) => Ok(SessionState::Leaving),
        (state, transition) => Err(TransitionError::Rejected { transition, state }),
    }
}
