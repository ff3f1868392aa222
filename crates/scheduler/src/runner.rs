//! Command execution.

use async_trait::async_trait;
use lectern_common::config::SchedulerConfig;
use tokio::process::Command;

use crate::SchedulerError;

/// Executes a console command by name.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion.
    async fn run(&self, command: &str) -> Result<(), SchedulerError>;
}

/// Runs commands as `<program> <args...> <command>` child processes.
#[derive(Debug, Clone)]
pub struct ProcessCommandRunner {
    program: String,
    args: Vec<String>,
}

impl ProcessCommandRunner {
    #[must_use]
    pub const fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }

    #[must_use]
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.command_program.clone(), config.command_args.clone())
    }
}

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn run(&self, command: &str) -> Result<(), SchedulerError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(command)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| SchedulerError::Spawn {
                command: command.to_string(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(SchedulerError::Failed {
                command: command.to_string(),
                code: status.code(),
            })
        }
    }
}
