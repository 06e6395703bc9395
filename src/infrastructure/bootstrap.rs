//! Composition root: wire adapters into the orchestrator.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::adapter::outbound::shell::ShellExecutor;
use crate::adapter::outbound::state::FileStateStore;
use crate::application::commands::MultipassCommands;
use crate::application::orchestrator::Orchestrator;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::executor::CommandExecutor;
use crate::port::outbound::state::StateStore;

/// Build an orchestrator running commands through the local shell and
/// keeping state in the JSON file at `state_path`.
pub fn build_orchestrator(config: &Config, state_path: &Path) -> Orchestrator {
    debug!(
        shell = %config.executor.shell,
        timeout_secs = config.executor.timeout_secs,
        state = %state_path.display(),
        "wiring orchestrator"
    );

    let executor: Arc<dyn CommandExecutor> = Arc::new(ShellExecutor::from_config(&config.executor));
    let store: Arc<dyn StateStore> = Arc::new(FileStateStore::new(state_path));
    build_with(config, executor, store)
}

/// Build an orchestrator over the given executor and store.
pub fn build_with(
    config: &Config,
    executor: Arc<dyn CommandExecutor>,
    store: Arc<dyn StateStore>,
) -> Orchestrator {
    Orchestrator::new(
        executor,
        store,
        MultipassCommands::new(config.vm.shape()),
        config.cluster.node_prefix.clone(),
    )
}
