//! Command execution port.

use async_trait::async_trait;

use crate::error::Result;

/// Captured result of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Process exit code; `-1` when the process was killed by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// True when the command exited with status 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last non-empty line of stderr, for compact error messages.
    #[must_use]
    pub fn stderr_tail(&self) -> &str {
        self.stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("no output")
    }
}

/// Runs commands against a named target.
///
/// The target names the machine the command acts on. The engine uses it to
/// serialize commands per target; implementations may use it for routing
/// or logging. A non-zero exit is reported through [`CommandOutput`], not as
/// an error.
///
/// # Errors
///
/// [`run`](Self::run) returns an error only when the command could not be
/// run or did not finish (spawn failure, timeout).
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Return the executor name for logging.
    fn name(&self) -> &'static str;

    /// Run `command` against `target` and capture its output.
    async fn run(&self, target: &str, command: &str) -> Result<CommandOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_tail_skips_trailing_blank_lines() {
        let output = CommandOutput::failed(1, "launching\ninstance already exists\n\n");
        assert_eq!(output.stderr_tail(), "instance already exists");
        assert!(!output.success());
    }

    #[test]
    fn stderr_tail_of_silent_failure() {
        assert_eq!(CommandOutput::failed(2, "").stderr_tail(), "no output");
    }
}
