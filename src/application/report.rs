//! Formation report.
//!
//! Assembled after the engine run by awaiting every handle of the
//! formation graph. All handles have settled by then, so collecting never
//! runs anything new.

use std::net::Ipv4Addr;

use serde::Serialize;

use super::engine::OperationReport;
use super::formation::{FormationGraph, NodeHandles};
use crate::domain::{ClusterOutputs, EdgeOutcome, FormationError, JoinState, NodeName};

/// Where one node ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeReport {
    pub name: NodeName,
    pub is_master: bool,
    pub address: Option<Ipv4Addr>,
    pub provisioned: bool,
    pub installed: bool,
    /// Incoming hosts entries written.
    pub mesh_applied: usize,
    /// Incoming hosts entries skipped because the source had no address.
    pub mesh_skipped: usize,
    pub mesh_failed: usize,
    /// `None` for the master, which never joins.
    pub join: Option<JoinState>,
}

/// Outcome of `up`.
#[derive(Debug, Clone)]
pub struct FormationReport {
    /// Per-node summary in index order.
    pub nodes: Vec<NodeReport>,
    /// Per-operation outcome in declaration order.
    pub operations: Vec<OperationReport>,
    /// Stack outputs known after the run.
    pub outputs: ClusterOutputs,
    /// Distinct root failures.
    pub failures: Vec<FormationError>,
}

impl FormationReport {
    /// Collect the report from a settled graph.
    pub async fn collect(graph: &FormationGraph, operations: Vec<OperationReport>) -> Self {
        let mut failures = Failures::default();
        let mut nodes = Vec::with_capacity(graph.nodes.len());

        for handles in &graph.nodes {
            nodes.push(node_report(handles, graph, &mut failures).await);
        }

        let credential = failures.check(graph.credential.resolve().await);
        failures.check(graph.load_balancer.resolve().await);
        let master_address = match graph.master() {
            Some(master) => master.address.resolve().await.ok(),
            None => None,
        };

        Self {
            nodes,
            operations,
            outputs: ClusterOutputs {
                cluster_credential: credential,
                master_address,
            },
            failures: failures.0,
        }
    }

    /// True when nothing failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Workers that joined.
    #[must_use]
    pub fn joined(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.join == Some(JoinState::Joined))
            .count()
    }
}

async fn node_report(
    handles: &NodeHandles,
    graph: &FormationGraph,
    failures: &mut Failures,
) -> NodeReport {
    let provisioned = failures.check(handles.created.resolve().await).is_some();
    let address = failures.check(handles.address.resolve().await);
    let installed = failures.check(handles.installed.resolve().await).is_some();

    let (mut mesh_applied, mut mesh_skipped, mut mesh_failed) = (0, 0, 0);
    for edge in &handles.mesh {
        match failures.check(edge.resolve().await) {
            Some(EdgeOutcome::Applied) => mesh_applied += 1,
            Some(EdgeOutcome::Skipped) => mesh_skipped += 1,
            None => mesh_failed += 1,
        }
    }

    if let Some(joined) = &handles.joined {
        failures.check(joined.resolve().await);
    }

    NodeReport {
        name: handles.node.name().clone(),
        is_master: handles.node.is_master(),
        address,
        provisioned,
        installed,
        mesh_applied,
        mesh_skipped,
        mesh_failed,
        join: graph.tracker.state(handles.node.name()),
    }
}

#[derive(Default)]
struct Failures(Vec<FormationError>);

impl Failures {
    /// Keep the value, or record the root cause once.
    fn check<T>(&mut self, outcome: Result<T, FormationError>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                let root = e.root_cause().clone();
                if !self.0.contains(&root) {
                    self.0.push(root);
                }
                None
            }
        }
    }
}
