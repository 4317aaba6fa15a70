//! Session controller
//!
//! Owns the current state and the active strategy. Validates guards, plays
//! the strategy's step script, applies the settled state and hands the guided
//! run off to the standard strategy once it finishes.

use crate::prefs::{FirstRunFlag, PrefsError};
use crate::state_machine::{self, SessionState, TransitionError, TransitionKind};
use crate::strategy::{self, Completion, Step, StepTiming, StrategyKind, TransitionStrategy};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Completion handler invoked after the settled state has been written
pub type OnSettled = Box<dyn FnOnce() + Send + 'static>;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Preference store error: {0}")]
    Prefs(#[from] PrefsError),
    #[error("Session runtime is no longer running")]
    RuntimeClosed,
}

/// Point-in-time view for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// A transition is running toward its settled state
    pub in_progress: bool,
    pub strategy: StrategyKind,
    pub first_run_complete: bool,
}

/// A transition that passed its guard and whose script has not run yet
#[derive(Debug)]
pub struct PendingTransition {
    transition: TransitionKind,
    steps: Vec<Step>,
}

impl PendingTransition {
    /// Play the script; suspends at every wait
    pub async fn play(&self) -> Completion {
        strategy::play(self.transition, &self.steps).await
    }
}

/// Result of settling a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub state: SessionState,
    /// The guided run ended and the controller switched to standard
    pub guided_run_finished: bool,
}

pub struct SessionController {
    state: SessionState,
    strategy: Box<dyn TransitionStrategy>,
    timing: StepTiming,
    first_run: FirstRunFlag,
    state_tx: watch::Sender<SessionState>,
    /// Fire-and-forget write of the first-run flag
    persist_task: Option<JoinHandle<()>>,
}

impl SessionController {
    /// Create a controller with an explicit first-run choice
    pub fn new(first_run: FirstRunFlag, timing: StepTiming, is_first_run: bool) -> Self {
        let (state_tx, _) = watch::channel(SessionState::NotInSession);
        let mut controller = Self {
            state: SessionState::NotInSession,
            strategy: StrategyKind::Standard.build(timing),
            timing,
            first_run,
            state_tx,
            persist_task: None,
        };
        controller.reset_to_initial(is_first_run);
        controller
    }

    /// Create a controller, reading the persisted first-run flag
    pub async fn load(first_run: FirstRunFlag, timing: StepTiming) -> Result<Self, SessionError> {
        let completed = first_run.has_completed_first_run().await?;
        Ok(Self::new(first_run, timing, !completed))
    }

    #[must_use]
    pub fn current_state(&self) -> SessionState {
        self.state
    }

    /// Receive every state change, including in-progress values
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    #[must_use]
    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        Ok(SessionSnapshot {
            state: self.state,
            in_progress: self.state.is_in_progress(),
            strategy: self.strategy.kind(),
            first_run_complete: self.first_run.has_completed_first_run().await?,
        })
    }

    /// Evaluate the active strategy's guard against the current state
    pub fn check(&self, transition: TransitionKind) -> Result<(), TransitionError> {
        if self.strategy.can_begin(transition, self.state) {
            Ok(())
        } else {
            Err(TransitionError::Rejected {
                transition,
                state: self.state,
            })
        }
    }

    /// Accept a transition: publish its in-progress state and hand back the
    /// script to play. A rejected request changes nothing.
    ///
    /// The active strategy's guard gates the request; the pure transition
    /// table supplies the in-progress state.
    pub fn begin(&mut self, transition: TransitionKind) -> Result<PendingTransition, TransitionError> {
        let in_progress = match self
            .check(transition)
            .and_then(|()| state_machine::begin(self.state, transition))
        {
            Ok(in_progress) => in_progress,
            Err(err) => {
                tracing::debug!(transition = %transition, state = %self.state, "Transition rejected by guard");
                return Err(err);
            }
        };

        let steps = self.strategy.script(transition);
        self.set_state(in_progress);
        tracing::info!(
            transition = %transition,
            strategy = %self.strategy.kind(),
            state = %self.state,
            wait_ms = %strategy::total_wait(&steps).as_millis(),
            "Transition accepted"
        );

        Ok(PendingTransition { transition, steps })
    }

    /// Finish a played transition
    ///
    /// Order: guided hand-off (if signalled), settled state, then `on_settled`.
    pub fn settle(
        &mut self,
        pending: PendingTransition,
        completion: Completion,
        on_settled: Option<OnSettled>,
    ) -> Settlement {
        let guided_run_finished = completion.guided_finished && self.finish_guided_run();

        let settled = pending.transition.settled_state();
        self.set_state(settled);
        tracing::info!(transition = %pending.transition, state = %settled, "Transition settled");

        if let Some(on_settled) = on_settled {
            on_settled();
        }

        Settlement {
            state: settled,
            guided_run_finished,
        }
    }

    /// Request a transition and drive it to completion
    ///
    /// Taking `&mut self` keeps at most one request outstanding per controller.
    /// Guard failure returns `Err` without touching state or the callback;
    /// callers wanting silent rejection can ignore it.
    pub async fn request_transition(
        &mut self,
        transition: TransitionKind,
        on_settled: Option<OnSettled>,
    ) -> Result<SessionState, TransitionError> {
        let pending = self.begin(transition)?;
        let completion = pending.play().await;
        Ok(self.settle(pending, completion, on_settled).state)
    }

    /// Select the strategy for a (non-)first run and return to `NotInSession`
    pub fn reset_to_initial(&mut self, first_run: bool) {
        let kind = StrategyKind::for_first_run(first_run);
        self.strategy = kind.build(self.timing);
        self.set_state(SessionState::NotInSession);
        tracing::info!(strategy = %kind, "Session reset");
    }

    /// Explicit "reset guided run" action: forget the completed run and
    /// start over with the guided strategy
    pub async fn reset_guided_run(&mut self) -> Result<(), SessionError> {
        self.wait_for_persistence().await;
        self.first_run.clear_first_run_flag().await?;
        self.reset_to_initial(true);
        Ok(())
    }

    /// Wait for an outstanding first-run write, if any
    pub async fn wait_for_persistence(&mut self) {
        if let Some(task) = self.persist_task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "First-run persistence task failed");
            }
        }
    }

    fn set_state(&mut self, state: SessionState) {
        self.state = state;
        self.state_tx.send_replace(state);
    }

    /// Swap to the standard strategy and persist completion without awaiting it.
    /// Returns false unless the guided strategy is active.
    fn finish_guided_run(&mut self) -> bool {
        if self.strategy.kind() != StrategyKind::Guided {
            return false;
        }

        self.strategy = StrategyKind::Standard.build(self.timing);
        tracing::info!("Guided run finished, switched to standard strategy");

        let first_run = self.first_run.clone();
        self.persist_task = Some(tokio::spawn(async move {
            if let Err(e) = first_run.mark_first_run_complete().await {
                tracing::error!(error = %e, "Failed to persist first-run completion");
            }
        }));
        true
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("strategy", &self.strategy.kind())
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}
