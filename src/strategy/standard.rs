//! Standard strategy: one timed wait per transition

use super::{Step, StepTiming, StrategyKind, TransitionStrategy};
use crate::state_machine::TransitionKind;

/// Trace labels emitted before and after the main wait
pub(super) fn labels(transition: TransitionKind) -> (&'static str, &'static str) {
    match transition {
        TransitionKind::Enter => ("Entering", "Entered"),
        TransitionKind::Quit => ("Quitting", "Quitted"),
        TransitionKind::Join => ("Joining", "Joined"),
        TransitionKind::Leave => ("Leaving", "Left"),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardStrategy {
    timing: StepTiming,
}

impl StandardStrategy {
    pub fn new(timing: StepTiming) -> Self {
        Self { timing }
    }

    #[must_use]
    pub fn timing(&self) -> StepTiming {
        self.timing
    }
}

impl TransitionStrategy for StandardStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Standard
    }

    fn script(&self, transition: TransitionKind) -> Vec<Step> {
        let (start, end) = labels(transition);
        vec![
            Step::Trace(start),
            Step::Wait(self.timing.settle_wait()),
            Step::Trace(end),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::SessionState;
    use crate::strategy::total_wait;
    use std::time::Duration;

    #[test]
    fn test_every_transition_waits_two_units() {
        let strategy = StandardStrategy::default();
        for kind in TransitionKind::ALL {
            let script = strategy.script(kind);
            assert_eq!(total_wait(&script), Duration::from_secs(2));
            assert!(!script.contains(&Step::FinishGuided));
        }
    }

    #[test]
    fn test_leave_script() {
        let strategy = StandardStrategy::new(StepTiming::new(Duration::from_millis(100)));
        assert_eq!(
            strategy.script(TransitionKind::Leave),
            vec![
                Step::Trace("Leaving"),
                Step::Wait(Duration::from_millis(200)),
                Step::Trace("Left"),
            ]
        );
    }

    #[test]
    fn test_guards_follow_graph() {
        let strategy = StandardStrategy::default();
        assert!(strategy.can_begin(TransitionKind::Enter, SessionState::NotInSession));
        assert!(!strategy.can_begin(TransitionKind::Enter, SessionState::InSession));
        assert!(strategy.can_begin(TransitionKind::Leave, SessionState::Joined));
        assert!(!strategy.can_begin(TransitionKind::Join, SessionState::Joining));
    }
}
