//! Scheduler errors.

use thiserror::Error;

/// Failure of a single scheduled command run.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The console program could not be started.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        /// Command name.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited unsuccessfully.
    #[error("`{command}` exited with {}", code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}")))]
    Failed {
        /// Command name.
        command: String,
        /// Exit status, absent when killed by a signal.
        code: Option<i32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_display() {
        let err = SchedulerError::Failed {
            command: "demo:cleanup".to_string(),
            code: Some(2),
        };
        assert_eq!(err.to_string(), "`demo:cleanup` exited with status 2");

        let err = SchedulerError::Failed {
            command: "demo:cleanup".to_string(),
            code: None,
        };
        assert_eq!(err.to_string(), "`demo:cleanup` exited with a signal");
    }
}
