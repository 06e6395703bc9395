//! Assembly of the per-stage declarations into one graph.

use std::net::Ipv4Addr;

use tracing::debug;

use super::joiner::{self, JoinGate, JoinTracker, TokenLedger};
use super::{installer, mesh, provisioner, resolver};
use crate::application::commands::MultipassCommands;
use crate::application::deferred::Deferred;
use crate::application::engine::Engine;
use crate::domain::{ClusterCredential, EdgeOutcome, FormationError, Node, NodeSet};
use crate::error::Result;

/// Turn an operation failure into a formation failure kind.
///
/// Blocked errors already carry their root cause and pass through.
pub(crate) fn classify(
    error: FormationError,
    kind: impl FnOnce(String) -> FormationError,
) -> FormationError {
    if error.is_blocked() {
        error
    } else {
        kind(error.to_string())
    }
}

/// Deferred state of one node.
#[derive(Debug, Clone)]
pub struct NodeHandles {
    /// Identity.
    pub node: Node,
    /// VM launched.
    pub created: Deferred<()>,
    /// First IPv4 address.
    pub address: Deferred<Ipv4Addr>,
    /// Runtime installed.
    pub installed: Deferred<()>,
    /// Outcomes of the mesh edges targeting this node.
    pub mesh: Vec<Deferred<EdgeOutcome>>,
    /// Join completion; `None` on the master.
    pub joined: Option<Deferred<()>>,
}

/// Handles to everything the formation pipeline declared.
#[derive(Debug, Clone)]
pub struct FormationGraph {
    /// Per-node handles, in index order.
    pub nodes: Vec<NodeHandles>,
    /// Admin kubeconfig of the master.
    pub credential: Deferred<ClusterCredential>,
    /// Load balancer enabled on the master.
    pub load_balancer: Deferred<()>,
    /// Join progress per worker.
    pub tracker: JoinTracker,
}

impl FormationGraph {
    /// Handles of the master node.
    #[must_use]
    pub fn master(&self) -> Option<&NodeHandles> {
        self.nodes.iter().find(|handles| handles.node.is_master())
    }
}

/// Declare the full formation pipeline for `nodes` on `engine`.
///
/// # Errors
///
/// Fails only when an operation name collides with one already declared.
pub fn declare(
    engine: &mut Engine,
    nodes: &NodeSet,
    commands: &MultipassCommands,
) -> Result<FormationGraph> {
    debug!(nodes = nodes.len(), "declaring formation graph");

    let mut created = Vec::with_capacity(nodes.len());
    let mut addresses = Vec::with_capacity(nodes.len());
    for node in nodes.iter() {
        let done = provisioner::provision(engine, commands, node)?;
        addresses.push(resolver::resolve_address(engine, commands, node, &done)?);
        created.push(done);
    }

    let incoming = mesh::propagate(engine, commands, nodes, &created, &addresses)?;

    let mut installed = Vec::with_capacity(nodes.len());
    for (node, done) in nodes.iter().zip(&created) {
        installed.push(installer::install(engine, commands, node, done)?);
    }

    let master = nodes.master();
    let master_outputs = installer::configure_master(
        engine,
        commands,
        master,
        &installed[master.index()],
        &addresses[master.index()],
    )?;

    let tracker = JoinTracker::default();
    let ledger = TokenLedger::default();
    let master_installed = installed[master.index()].clone();
    let master_address = addresses[master.index()].unit();
    let mut handles = Vec::with_capacity(nodes.len());

    for ((node, mesh), created) in nodes.iter().zip(incoming).zip(created) {
        let address = addresses[node.index()].clone();
        let node_installed = installed[node.index()].clone();

        let joined = if node.is_master() {
            None
        } else {
            let gate = JoinGate {
                mesh: Deferred::all(mesh.iter().cloned()).zip(&address).unit(),
                master_installed: master_installed.clone(),
                master_address: master_address.clone(),
                installed: node_installed.clone(),
            };
            Some(joiner::join_worker(
                engine, commands, master, node, &gate, &tracker, &ledger,
            )?)
        };

        handles.push(NodeHandles {
            node: node.clone(),
            created,
            address,
            installed: node_installed,
            mesh,
            joined,
        });
    }

    Ok(FormationGraph {
        nodes: handles,
        credential: master_outputs.credential,
        load_balancer: master_outputs.load_balancer,
        tracker,
    })
}
