//! Session console - drives a session controller from typed commands
//!
//! Commands: `enter`, `quit`, `join`, `leave`, `reset`, `state`, `exit`.

use session_lifecycle::config::SessionConfig;
use session_lifecycle::prefs::{FirstRunFlag, MemoryPrefs, PreferenceStore, SqlitePrefs};
use session_lifecycle::presentation::render_state;
use session_lifecycle::{
    OnSettled, SessionController, SessionHandle, SessionRuntime, SessionState, TransitionKind,
};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_lifecycle=info,session_console=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = SessionConfig::from_env();
    let store = open_store(config.prefs_path.as_deref())?;
    let first_run = FirstRunFlag::new(store);

    let controller = SessionController::load(first_run.clone(), config.timing).await?;
    tracing::info!(
        strategy = %controller.strategy_kind(),
        unit_ms = %config.timing.unit.as_millis(),
        "Session controller ready"
    );

    let (handle, runtime_task) = SessionRuntime::spawn(controller);
    let display_task = tokio::spawn(display_states(handle.watch_state(), first_run));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if !dispatch(&handle, command).await? {
            break;
        }
    }

    // Dropping the last handle lets the runtime finish its in-flight work
    drop(handle);
    runtime_task.await?;
    display_task.abort();
    Ok(())
}

fn open_store(path: Option<&Path>) -> Result<Arc<dyn PreferenceStore>, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        tracing::info!("Using in-memory preferences");
        return Ok(Arc::new(MemoryPrefs::new()));
    };

    // Ensure preference directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::info!(path = %path.display(), "Opening preference database");
    Ok(Arc::new(SqlitePrefs::open(path)?))
}

/// Handle one typed command; returns false when the console should exit
async fn dispatch(handle: &SessionHandle, command: &str) -> Result<bool, Box<dyn std::error::Error>> {
    if let Some(kind) = TransitionKind::from_command(command) {
        let on_settled: OnSettled = Box::new(move || println!("{kind} done"));
        handle.request(kind, Some(on_settled)).await?;
        return Ok(true);
    }

    match command {
        "reset" => handle.reset_guided_run().await?,
        "state" => {
            let snapshot = handle.snapshot().await?;
            println!("{}", serde_json::to_string(&snapshot)?);
        }
        "exit" => return Ok(false),
        other => println!("unknown command: {other}"),
    }
    Ok(true)
}

/// Print the display text on every state change
async fn display_states(mut state_rx: watch::Receiver<SessionState>, first_run: FirstRunFlag) {
    loop {
        let state = *state_rx.borrow_and_update();
        let first_run_complete = first_run.has_completed_first_run().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read first-run flag");
            false
        });
        println!("{}", render_state(state, first_run_complete));

        if state_rx.changed().await.is_err() {
            break;
        }
    }
}
