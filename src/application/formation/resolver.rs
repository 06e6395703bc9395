//! Node address discovery.

use std::net::Ipv4Addr;

use crate::application::commands::{names, MultipassCommands};
use crate::application::deferred::{Deferred, Outcome};
use crate::application::engine::{Engine, OperationSpec};
use crate::domain::address::parse_node_address;
use crate::domain::{FormationError, Node, NodeName};
use crate::error::Result;

/// Declare the info query for `node` once it exists and parse its first
/// IPv4 address from the output.
pub fn resolve_address(
    engine: &mut Engine,
    commands: &MultipassCommands,
    node: &Node,
    created: &Deferred<()>,
) -> Result<Deferred<Ipv4Addr>> {
    let name = node.name();
    let checked = name.clone();
    let info = engine.declare(
        OperationSpec::command(names::get_ip(name), name.as_str(), commands.info(name))
            .depends_on(created)
            .check_output(move |payload| address_of(&checked, payload).map(drop)),
    )?;

    let node = name.clone();
    Ok(info.stdout().and_then(move |payload| address_of(&node, &payload)))
}

fn address_of(node: &NodeName, payload: &str) -> Outcome<Ipv4Addr> {
    parse_node_address(node, payload).map_err(|source| FormationError::AddressResolutionFailure {
        node: node.clone(),
        source,
    })
}
