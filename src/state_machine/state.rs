//! Session state types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Outside any session
    #[default]
    NotInSession,

    /// `Enter` accepted, waiting for the session to open
    Entering,

    /// Inside a session, not attached to any sub-activity
    InSession,

    /// `Join` accepted, waiting to attach to the sub-activity
    Joining,

    /// Attached to a sub-activity
    Joined,

    /// `Leave` accepted, detaching from the sub-activity
    Leaving,

    /// `Quit` accepted, waiting for the session to close
    ExitingSession,
}

impl SessionState {
    pub const ALL: [SessionState; 7] = [
        SessionState::NotInSession,
        SessionState::Entering,
        SessionState::InSession,
        SessionState::Joining,
        SessionState::Joined,
        SessionState::Leaving,
        SessionState::ExitingSession,
    ];

    /// Check if a transition is currently running toward a settled state
    #[must_use]
    pub fn is_in_progress(self) -> bool {
        matches!(
            self,
            SessionState::Entering
                | SessionState::Joining
                | SessionState::Leaving
                | SessionState::ExitingSession
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::NotInSession => "NotInSession",
            SessionState::Entering => "Entering",
            SessionState::InSession => "InSession",
            SessionState::Joining => "Joining",
            SessionState::Joined => "Joined",
            SessionState::Leaving => "Leaving",
            SessionState::ExitingSession => "ExitingSession",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Transition Kinds
// ============================================================================

/// A transition the presentation layer can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Enter,
    Quit,
    Join,
    Leave,
}

impl TransitionKind {
    pub const ALL: [TransitionKind; 4] = [
        TransitionKind::Enter,
        TransitionKind::Quit,
        TransitionKind::Join,
        TransitionKind::Leave,
    ];

    /// The only state this transition may start from
    #[must_use]
    pub fn required_state(self) -> SessionState {
        match self {
            TransitionKind::Enter => SessionState::NotInSession,
            TransitionKind::Quit | TransitionKind::Join => SessionState::InSession,
            TransitionKind::Leave => SessionState::Joined,
        }
    }

    /// State published the moment the transition is accepted
    #[must_use]
    pub fn in_progress_state(self) -> SessionState {
        match self {
            TransitionKind::Enter => SessionState::Entering,
            TransitionKind::Quit => SessionState::ExitingSession,
            TransitionKind::Join => SessionState::Joining,
            TransitionKind::Leave => SessionState::Leaving,
        }
    }

    /// State written once the step script has finished
    #[must_use]
    pub fn settled_state(self) -> SessionState {
        match self {
            TransitionKind::Enter | TransitionKind::Leave => SessionState::InSession,
            TransitionKind::Quit => SessionState::NotInSession,
            TransitionKind::Join => SessionState::Joined,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionKind::Enter => "enter",
            TransitionKind::Quit => "quit",
            TransitionKind::Join => "join",
            TransitionKind::Leave => "leave",
        }
    }

    /// Parse a command word typed by the user
    #[must_use]
    pub fn from_command(word: &str) -> Option<Self> {
        match word.trim().to_ascii_lowercase().as_str() {
            "enter" => Some(TransitionKind::Enter),
            "quit" => Some(TransitionKind::Quit),
            "join" => Some(TransitionKind::Join),
            "leave" => Some(TransitionKind::Leave),
            _ => None,
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
