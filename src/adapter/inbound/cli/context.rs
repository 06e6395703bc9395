//! Shared command context.

use std::path::PathBuf;

use crate::application::Orchestrator;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

use super::command::Cli;
use super::paths;

/// What every stack command needs: validated configuration and the state
/// file it operates on.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub state_path: PathBuf,
}

impl Context {
    /// Load the configuration named by `--config`, or defaults when that
    /// file does not exist. `--state` wins over `[state] path`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file exists but is invalid.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config = Config::load_or_default(&cli.config)?;
        let state_path = cli
            .state
            .clone()
            .unwrap_or_else(|| config.state_path(paths::default_state));
        Ok(Self { config, state_path })
    }

    /// Node count from the command line, falling back to `[cluster] nodes`.
    #[must_use]
    pub fn node_count(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.config.cluster.nodes)
    }

    /// Orchestrator over the local shell and the state file.
    #[must_use]
    pub fn orchestrator(&self) -> Orchestrator {
        bootstrap::build_orchestrator(&self.config, &self.state_path)
    }
}
