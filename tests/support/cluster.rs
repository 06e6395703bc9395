use std::sync::Arc;

use clusterforge::adapter::outbound::state::MemoryStateStore;
use clusterforge::application::Orchestrator;
use clusterforge::infrastructure::bootstrap;
use clusterforge::infrastructure::config::settings::Config;
use clusterforge::testkit::multipass::FakeMultipass;

/// A fake multipass host with an in-memory state file.
pub struct TestCluster {
    pub fake: FakeMultipass,
    pub store: MemoryStateStore,
    pub orchestrator: Orchestrator,
}

impl TestCluster {
    pub fn new() -> Self {
        Self::with_fake(FakeMultipass::new())
    }

    pub fn with_fake(fake: FakeMultipass) -> Self {
        let store = MemoryStateStore::new();
        let orchestrator = bootstrap::build_with(
            &Config::default(),
            Arc::new(fake.clone()),
            Arc::new(store.clone()),
        );
        Self {
            fake,
            store,
            orchestrator,
        }
    }

    /// Commands run after the first `skip`.
    pub fn executed_since(&self, skip: usize) -> Vec<String> {
        self.fake.executed().into_iter().skip(skip).collect()
    }
}

pub fn node(index: usize) -> String {
    format!("microk8s-node{index}")
}

/// Index of the first command in `commands` containing `needle`.
pub fn index_of(commands: &[String], needle: &str) -> usize {
    commands
        .iter()
        .position(|command| command.contains(needle))
        .unwrap_or_else(|| panic!("no command contains {needle:?}: {commands:#?}"))
}
