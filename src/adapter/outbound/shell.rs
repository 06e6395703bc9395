//! Local shell command executor.
//!
//! Every command is handed to `<shell> -c` on the local machine. Multipass
//! itself routes `multipass exec <vm> -- ...` into the VM, so the target is
//! only used for logging.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::infrastructure::config::settings::ExecutorConfig;
use crate::port::outbound::executor::{CommandExecutor, CommandOutput};

/// Runs commands through a local shell with a timeout.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
    timeout: Duration,
}

impl ShellExecutor {
    /// Create an executor using `shell` and a per-command timeout.
    pub fn new(shell: impl Into<String>, timeout: Duration) -> Self {
        Self {
            shell: shell.into(),
            timeout,
        }
    }

    /// Create an executor from the `[executor]` section.
    #[must_use]
    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self::new(config.shell.clone(), config.timeout())
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    fn name(&self) -> &'static str {
        "shell"
    }

    async fn run(&self, target: &str, command: &str) -> Result<CommandOutput> {
        trace!(target = %target, shell = %self.shell, "spawning command");

        let mut child = Command::new(&self.shell);
        child
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, child.output())
            .await
            .map_err(|_| Error::CommandTimeout {
                command: program(command),
                seconds: self.timeout.as_secs(),
            })??;

        let exit_code = output.status.code().unwrap_or(-1);
        debug!(target = %target, exit_code, "command finished");

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
        })
    }
}

/// Leading words of a command, enough to identify it in an error without
/// echoing arguments such as join tokens.
fn program(command: &str) -> String {
    command.split_whitespace().take(3).collect::<Vec<_>>().join(" ")
}
