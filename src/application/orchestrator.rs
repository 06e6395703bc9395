//! Cluster lifecycle use cases.

use std::sync::Arc;

use tracing::{info, warn};

use super::commands::MultipassCommands;
use super::engine::{Engine, PlannedOperation};
use super::formation;
use super::report::FormationReport;
use super::teardown::{teardown, TeardownReport};
use crate::domain::{ClusterOutputs, NodeSet, StackState};
use crate::error::Result;
use crate::port::outbound::executor::CommandExecutor;
use crate::port::outbound::state::StateStore;

/// Forms, inspects and destroys a cluster.
pub struct Orchestrator {
    executor: Arc<dyn CommandExecutor>,
    store: Arc<dyn StateStore>,
    commands: MultipassCommands,
    node_prefix: String,
}

impl Orchestrator {
    /// Create an orchestrator.
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        store: Arc<dyn StateStore>,
        commands: MultipassCommands,
        node_prefix: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            store,
            commands,
            node_prefix: node_prefix.into(),
        }
    }

    /// Provision `count` nodes, install the runtime and form the cluster.
    ///
    /// Operations already recorded with the same command are not run again,
    /// so calling this on a formed cluster changes nothing. The state is
    /// saved even when some nodes failed.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid node count or prefix and when the
    /// state cannot be loaded or saved. Formation failures are reported in
    /// the returned [`FormationReport`].
    pub async fn up(&self, count: usize) -> Result<FormationReport> {
        let nodes = NodeSet::new(count, &self.node_prefix)?;
        let previous = self.store.load().await?;
        let previous_outputs = previous.outputs.clone();

        let mut engine = Engine::new(Arc::clone(&self.executor), previous);
        let graph = formation::declare(&mut engine, &nodes, &self.commands)?;
        info!(nodes = nodes.len(), operations = engine.plan().len(), "forming cluster");

        let run = engine.run().await;
        let created = run.created();
        let report = FormationReport::collect(&graph, run.operations).await;

        let mut state = run.state;
        state.outputs = if report.outputs.is_empty() {
            previous_outputs
        } else {
            report.outputs.clone()
        };
        self.store.save(&state).await?;

        if report.is_success() {
            info!(executed = created, joined = report.joined(), "cluster formed");
        } else {
            warn!(
                executed = created,
                failures = report.failures.len(),
                "cluster formed with failures"
            );
        }
        Ok(report)
    }

    /// The operations `up` would declare for `count` nodes.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid node count or prefix, or when the
    /// state cannot be loaded.
    pub async fn plan(&self, count: usize) -> Result<Vec<PlannedOperation>> {
        let nodes = NodeSet::new(count, &self.node_prefix)?;
        let previous = self.store.load().await?;

        let mut engine = Engine::new(Arc::clone(&self.executor), previous);
        formation::declare(&mut engine, &nodes, &self.commands)?;
        Ok(engine.plan())
    }

    /// Undo everything recorded in state, dependents first.
    ///
    /// # Errors
    ///
    /// Returns an error when the state cannot be loaded or saved. A failed
    /// delete is reported in the returned [`TeardownReport`].
    pub async fn destroy(&self) -> Result<TeardownReport> {
        let state = self.store.load().await?;
        info!(operations = state.operations.len(), "destroying cluster");

        let report = teardown(self.executor.as_ref(), state).await;
        self.store.save(&report.state).await?;
        Ok(report)
    }

    /// Everything currently recorded.
    ///
    /// # Errors
    ///
    /// Returns an error when the state cannot be loaded.
    pub async fn state(&self) -> Result<StackState> {
        self.store.load().await
    }

    /// Outputs of the last `up`.
    ///
    /// # Errors
    ///
    /// Returns an error when the state cannot be loaded.
    pub async fn outputs(&self) -> Result<ClusterOutputs> {
        Ok(self.store.load().await?.outputs)
    }
}
