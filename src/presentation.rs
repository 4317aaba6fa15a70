//! Display text for the session state

use crate::state_machine::SessionState;

/// Prefix shown while the guided run has not been completed
pub const GUIDED_PREFIX: &str = "[TUTORIAL] ";

/// Render the state for display; the prefix is cosmetic only
#[must_use]
pub fn render_state(state: SessionState, first_run_complete: bool) -> String {
    if first_run_complete {
        state.to_string()
    } else {
        format!("{GUIDED_PREFIX}{state}")
    }
}
