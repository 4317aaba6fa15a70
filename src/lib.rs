//! Session lifecycle controller
//!
//! Moves a session between "not in session", "in session" and "joined to a
//! sub-activity". Every transition is gated by a guard and runs as a timed
//! step script supplied by the active strategy. A first-run guided strategy
//! narrates `Join` and `Leave` and hands over to the standard strategy once
//! its last step has run.

pub mod config;
pub mod controller;
pub mod prefs;
pub mod presentation;
pub mod runtime;
pub mod state_machine;
pub mod strategy;

pub use controller::{OnSettled, SessionController, SessionError, SessionSnapshot};
pub use runtime::{SessionEvent, SessionHandle, SessionRuntime};
pub use state_machine::{SessionState, TransitionError, TransitionKind};
pub use strategy::{StepTiming, StrategyKind, TransitionStrategy};
