//! Periodic console commands for lectern.
//!
//! - **Schedule**: which commands run and how often
//! - **Runner**: executes a command by name, usually as a child process
//!
//! Each registered command gets its own task; a failing run is logged and
//! the command is tried again at its next slot.

pub mod error;
pub mod runner;
pub mod schedule;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

pub use error::SchedulerError;
pub use runner::{CommandRunner, ProcessCommandRunner};
pub use schedule::{Cadence, ScheduledCommand, default_schedule};

/// Spawn one task per scheduled command.
pub fn run_scheduler<R: CommandRunner + 'static>(
    schedule: Vec<ScheduledCommand>,
    runner: Arc<R>,
) -> Vec<JoinHandle<()>> {
    schedule
        .into_iter()
        .map(|command| {
            let runner = runner.clone();
            tracing::info!(
                command = %command.name,
                cadence = ?command.cadence,
                "Registered scheduled command"
            );

            tokio::spawn(async move {
                loop {
                    let now = Utc::now();
                    let next = command.cadence.next_after(now);
                    let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
                    tokio::time::sleep(wait).await;

                    run_once(runner.as_ref(), &command.name).await;
                }
            })
        })
        .collect()
}

/// Run a command a single time, logging the outcome.
///
/// Returns whether the command succeeded.
pub async fn run_once<R: CommandRunner + ?Sized>(runner: &R, command: &str) -> bool {
    tracing::debug!(command, "Running scheduled command");

    match runner.run(command).await {
        Ok(()) => {
            tracing::info!(command, "Scheduled command finished");
            true
        }
        Err(e) => {
            tracing::error!(command, error = %e, "Scheduled command failed");
            false
        }
    }
}
