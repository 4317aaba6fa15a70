//! Guided strategy for the first run
//!
//! Same guards as the standard strategy. `Join` and `Leave` narrate three
//! extra steps; `Leave` also marks the end of the guided run.

use super::standard::labels;
use super::{StandardStrategy, Step, StepTiming, StrategyKind, TransitionStrategy};
use crate::state_machine::{SessionState, TransitionKind};

const JOIN_NARRATION: [&str; 3] = [
    "Joining attaches you to a sub-activity",
    "You stay in the session while joined",
    "Leave returns you to the session",
];

const LEAVE_NARRATION: [&str; 3] = [
    "Leaving detaches you from the sub-activity",
    "The session stays open after leaving",
    "Guided run complete",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct GuidedStrategy {
    standard: StandardStrategy,
}

impl GuidedStrategy {
    pub fn new(timing: StepTiming) -> Self {
        Self {
            standard: StandardStrategy::new(timing),
        }
    }

    fn narrated(&self, transition: TransitionKind, narration: [&'static str; 3]) -> Vec<Step> {
        let timing = self.standard.timing();
        let (start, end) = labels(transition);

        let mut steps = vec![Step::Trace(start), Step::Wait(timing.settle_wait())];
        for line in narration {
            steps.push(Step::Trace(line));
            steps.push(Step::Wait(timing.narration_wait()));
        }
        steps.push(Step::Trace(end));
        steps
    }
}

impl TransitionStrategy for GuidedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Guided
    }

    fn can_begin(&self, transition: TransitionKind, state: SessionState) -> bool {
        self.standard.can_begin(transition, state)
    }

    fn script(&self, transition: TransitionKind) -> Vec<Step> {
        match transition {
            TransitionKind::Enter | TransitionKind::Quit => self.standard.script(transition),
            TransitionKind::Join => self.narrated(transition, JOIN_NARRATION),
            TransitionKind::Leave => {
                let mut steps = self.narrated(transition, LEAVE_NARRATION);
                steps.push(Step::FinishGuided);
                steps
            }
        }
    }
}
