//! Hosts-table mesh propagation.
//!
//! One operation per ordered pair of nodes. An edge waits for its target to
//! exist and its source to have an address. When the source never gets an
//! address the edge is skipped rather than failed, so the target can still
//! join the cluster with a partial table.

use std::net::Ipv4Addr;

use super::graph::classify;
use crate::application::commands::{names, MultipassCommands};
use crate::application::deferred::Deferred;
use crate::application::engine::{Engine, OperationSpec};
use crate::domain::mesh::mesh_edges;
use crate::domain::{EdgeOutcome, FormationError, HostsEntry, NodeSet};
use crate::error::Result;

/// Declare every mesh edge.
///
/// Returns the edge outcomes grouped by target index, i.e. the incoming
/// edges of each node.
pub fn propagate(
    engine: &mut Engine,
    commands: &MultipassCommands,
    nodes: &NodeSet,
    created: &[Deferred<()>],
    addresses: &[Deferred<Ipv4Addr>],
) -> Result<Vec<Vec<Deferred<EdgeOutcome>>>> {
    let mut incoming: Vec<Vec<Deferred<EdgeOutcome>>> = vec![Vec::new(); nodes.len()];

    for edge in mesh_edges(nodes) {
        let (Some(source), Some(target)) = (nodes.get(edge.source), nodes.get(edge.target)) else {
            continue;
        };

        let source_address = addresses[edge.source].clone();
        let entry_name = source.name().clone();
        let target_name = target.name().clone();
        let create = {
            let commands = commands.clone();
            let target_name = target_name.clone();
            source_address.map(move |address| {
                commands.add_host(&target_name, &HostsEntry::new(address, entry_name))
            })
        };

        let resource = engine.declare(
            OperationSpec::new(
                names::host(source.name(), target.name()),
                target.name().as_str(),
                create,
            )
            .depends_on(&created[edge.target]),
        )?;

        let done = resource.done();
        let source_name = source.name().clone();
        let lineage = done.lineage().to_vec();
        let outcome = Deferred::from_future(async move {
            let Err(e) = done.resolve().await else {
                return Ok(EdgeOutcome::Applied);
            };
            if source_address.resolve().await.is_err() {
                return Ok(EdgeOutcome::Skipped);
            }
            Err(classify(e, |reason| FormationError::MeshPropagationFailure {
                source_node: source_name,
                target: target_name,
                reason,
            }))
        })
        .with_lineage(&lineage);

        incoming[edge.target].push(outcome);
    }

    Ok(incoming)
}
