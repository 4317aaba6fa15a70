//! Runtime for driving a session controller
//!
//! The runtime owns the controller and processes presentation commands one at
//! a time. While a transition is in flight it keeps listening: transition
//! requests are checked against the in-progress state (and so rejected) and
//! snapshots are answered. A reset is held until the transition has settled,
//! and nothing more is read from the channel until it has run, so commands
//! are never reordered.

#[cfg(test)]
pub mod testing;

use crate::controller::{OnSettled, SessionController, SessionError, SessionSnapshot};
use crate::state_machine::{SessionState, TransitionError, TransitionKind};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Requests sent by the presentation layer
pub enum Command {
    Transition {
        kind: TransitionKind,
        on_settled: Option<OnSettled>,
    },
    Reset {
        first_run: bool,
    },
    ResetGuidedRun,
    Snapshot {
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Transition { kind, on_settled } => f
                .debug_struct("Transition")
                .field("kind", kind)
                .field("has_callback", &on_settled.is_some())
                .finish(),
            Command::Reset { first_run } => {
                f.debug_struct("Reset").field("first_run", first_run).finish()
            }
            Command::ResetGuidedRun => f.write_str("ResetGuidedRun"),
            Command::Snapshot { .. } => f.write_str("Snapshot"),
        }
    }
}

/// Events broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    StateChanged {
        state: SessionState,
    },
    Rejected {
        transition: TransitionKind,
        state: SessionState,
    },
    GuidedRunFinished,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    state_rx: watch::Receiver<SessionState>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Request a transition; the callback fires after the settled state is written
    pub async fn request(
        &self,
        kind: TransitionKind,
        on_settled: Option<OnSettled>,
    ) -> Result<(), SessionError> {
        self.send(Command::Transition { kind, on_settled }).await
    }

    pub async fn enter(&self, on_settled: Option<OnSettled>) -> Result<(), SessionError> {
        self.request(TransitionKind::Enter, on_settled).await
    }

    pub async fn quit(&self, on_settled: Option<OnSettled>) -> Result<(), SessionError> {
        self.request(TransitionKind::Quit, on_settled).await
    }

    pub async fn join(&self, on_settled: Option<OnSettled>) -> Result<(), SessionError> {
        self.request(TransitionKind::Join, on_settled).await
    }

    pub async fn leave(&self, on_settled: Option<OnSettled>) -> Result<(), SessionError> {
        self.request(TransitionKind::Leave, on_settled).await
    }

    pub async fn reset(&self, first_run: bool) -> Result<(), SessionError> {
        self.send(Command::Reset { first_run }).await
    }

    pub async fn reset_guided_run(&self) -> Result<(), SessionError> {
        self.send(Command::ResetGuidedRun).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| SessionError::RuntimeClosed)?
    }

    /// Latest published state
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    async fn send(&self, command: Command) -> Result<(), SessionError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SessionError::RuntimeClosed)
    }
}

/// Event loop owning a [`SessionController`]
pub struct SessionRuntime {
    controller: SessionController,
    command_rx: mpsc::Receiver<Command>,
    event_tx: broadcast::Sender<SessionEvent>,
    /// Command waiting for the in-flight transition to settle
    held: Option<Command>,
    /// False once every handle has been dropped
    accepting: bool,
}

impl SessionRuntime {
    pub fn new(
        controller: SessionController,
        command_rx: mpsc::Receiver<Command>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            controller,
            command_rx,
            event_tx,
            held: None,
            accepting: true,
        }
    }

    /// Start the runtime in the background
    pub fn spawn(controller: SessionController) -> (SessionHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, _) = broadcast::channel(128);
        let handle = SessionHandle {
            command_tx,
            state_rx: controller.subscribe(),
            event_tx: event_tx.clone(),
        };

        let runtime = Self::new(controller, command_rx, event_tx);
        let task = tokio::spawn(runtime.run());
        (handle, task)
    }

    pub async fn run(mut self) {
        tracing::info!(
            state = %self.controller.current_state(),
            strategy = %self.controller.strategy_kind(),
            "Starting session runtime"
        );

        loop {
            let command = match self.held.take() {
                Some(command) => command,
                None if self.accepting => match self.command_rx.recv().await {
                    Some(command) => command,
                    None => break,
                },
                None => break,
            };
            self.process_command(command).await;
        }

        self.controller.wait_for_persistence().await;
        tracing::info!("Session runtime stopped");
    }

    async fn process_command(&mut self, command: Command) {
        match command {
            Command::Transition { kind, on_settled } => self.run_transition(kind, on_settled).await,
            Command::Reset { first_run } => {
                self.controller.reset_to_initial(first_run);
                self.emit_state();
            }
            Command::ResetGuidedRun => {
                if let Err(e) = self.controller.reset_guided_run().await {
                    tracing::error!(error = %e, "Failed to reset guided run");
                }
                self.emit_state();
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.controller.snapshot().await);
            }
        }
    }

    async fn run_transition(&mut self, kind: TransitionKind, on_settled: Option<OnSettled>) {
        let pending = match self.controller.begin(kind) {
            Ok(pending) => pending,
            Err(err) => {
                self.reject(err);
                return;
            }
        };
        self.emit_state();

        let completion = {
            let play = pending.play();
            tokio::pin!(play);
            loop {
                tokio::select! {
                    completion = &mut play => break completion,
                    command = self.command_rx.recv(), if self.accepting && self.held.is_none() => match command {
                        Some(command) => self.handle_while_busy(command).await,
                        None => self.accepting = false,
                    },
                }
            }
        };

        let settlement = self.controller.settle(pending, completion, on_settled);
        if settlement.guided_run_finished {
            let _ = self.event_tx.send(SessionEvent::GuidedRunFinished);
        }
        self.emit_state();
    }

    async fn handle_while_busy(&mut self, command: Command) {
        let command = match command {
            Command::Snapshot { reply } => {
                let _ = reply.send(self.controller.snapshot().await);
                return;
            }
            Command::Transition { kind, on_settled } => match self.controller.check(kind) {
                Err(err) => {
                    self.reject(err);
                    return;
                }
                // A transition whose guard passes waits like a reset
                Ok(()) => Command::Transition { kind, on_settled },
            },
            command => command,
        };
        tracing::debug!(?command, "Holding command until transition settles");
        self.held = Some(command);
    }

    fn reject(&self, err: TransitionError) {
        let TransitionError::Rejected { transition, state } = err;
        let _ = self
            .event_tx
            .send(SessionEvent::Rejected { transition, state });
    }

    fn emit_state(&self) {
        let _ = self.event_tx.send(SessionEvent::StateChanged {
            state: self.controller.current_state(),
        });
    }
}
