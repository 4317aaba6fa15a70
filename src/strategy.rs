//! Transition strategies
//!
//! A strategy decides, per transition, whether it may start and which step
//! script it runs. Scripts are plain data; [`play`] turns them into timed,
//! suspending work.

mod guided;
mod standard;

pub use guided::GuidedStrategy;
pub use standard::StandardStrategy;

use crate::state_machine::{guard, SessionState, TransitionKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default length of one time unit
pub const DEFAULT_TIME_UNIT: Duration = Duration::from_secs(1);

/// Scales every wait in a step script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTiming {
    pub unit: Duration,
}

impl StepTiming {
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }

    /// Main wait of every transition (2 units)
    #[must_use]
    pub fn settle_wait(&self) -> Duration {
        self.unit * 2
    }

    /// Wait after each narration line of the guided run (0.5 units)
    #[must_use]
    pub fn narration_wait(&self) -> Duration {
        self.unit / 2
    }
}

impl Default for StepTiming {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_UNIT)
    }
}

/// One discrete step of a transition's script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Suspend on a timer
    Wait(Duration),
    /// Emit an informational trace line
    Trace(&'static str),
    /// The guided run has shown its last step
    FinishGuided,
}

/// What happened while a script was played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Completion {
    pub guided_finished: bool,
}

/// Which strategy implementation is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Standard,
    Guided,
}

impl StrategyKind {
    /// Select the strategy for a (non-)first run
    #[must_use]
    pub fn for_first_run(first_run: bool) -> Self {
        if first_run {
            StrategyKind::Guided
        } else {
            StrategyKind::Standard
        }
    }

    #[must_use]
    pub fn build(self, timing: StepTiming) -> Box<dyn TransitionStrategy> {
        match self {
            StrategyKind::Standard => Box::new(StandardStrategy::new(timing)),
            StrategyKind::Guided => Box::new(GuidedStrategy::new(timing)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Standard => f.write_str("standard"),
            StrategyKind::Guided => f.write_str("guided"),
        }
    }
}

/// Guards and step scripts for the four transitions
pub trait TransitionStrategy: Send + Sync + fmt::Debug {
    fn kind(&self) -> StrategyKind;

    /// Check whether `transition` may start from `state`
    fn can_begin(&self, transition: TransitionKind, state: SessionState) -> bool {
        guard(transition, state)
    }

    /// The ordered steps to run once `transition` has been accepted
    fn script(&self, transition: TransitionKind) -> Vec<Step>;
}

/// Run a script to completion, strictly in order
///
/// Waits suspend on the tokio timer; nothing here blocks a thread.
pub async fn play(transition: TransitionKind, steps: &[Step]) -> Completion {
    let mut completion = Completion::default();
    for step in steps {
        match step {
            Step::Wait(duration) => tokio::time::sleep(*duration).await,
            Step::Trace(label) => {
                tracing::info!(transition = %transition, step = %label, "Transition step");
            }
            Step::FinishGuided => {
                tracing::debug!(transition = %transition, "Guided run reached its last step");
                completion.guided_finished = true;
            }
        }
    }
    completion
}

/// Sum of all waits in a script
#[must_use]
pub fn total_wait(steps: &[Step]) -> Duration {
    steps
        .iter()
        .map(|step| match step {
            Step::Wait(duration) => *duration,
            _ => Duration::ZERO,
        })
        .sum()
}
