//! Core session state machine
//!
//! Pure state and transition types. Timing and side effects live in the
//! strategy player and the controller.

pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use state::{SessionState, TransitionKind};
pub use transition::{begin, guard, TransitionError};
