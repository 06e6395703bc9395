//! Purge then launch each VM.

use super::graph::classify;
use crate::application::commands::{names, MultipassCommands};
use crate::application::deferred::Deferred;
use crate::application::engine::{Engine, OperationSpec};
use crate::domain::{FormationError, Node};
use crate::error::Result;

/// Declare purge and create for `node`.
///
/// Purging an absent VM exits non-zero, which is tolerated. The purge is
/// only replayed from state while the create is recorded too, so a VM that
/// was never launched is always purged first.
///
/// Returns the node's creation, failing with
/// [`FormationError::ProvisioningFailure`].
pub fn provision(
    engine: &mut Engine,
    commands: &MultipassCommands,
    node: &Node,
) -> Result<Deferred<()>> {
    let name = node.name();

    let purge = engine.declare(
        OperationSpec::command(names::purge(name), name.as_str(), commands.purge(name))
            .delete(commands.purge_all())
            .ignore_failure()
            .consumed_by(names::create(name)),
    )?;

    let create = engine.declare(
        OperationSpec::command(names::create(name), name.as_str(), commands.launch(name))
            .delete(commands.delete(name))
            .delete_may_fail()
            .depends_on(&purge.done()),
    )?;

    let node = name.clone();
    Ok(create.done().map_err(move |e| {
        classify(e, |reason| FormationError::ProvisioningFailure { node, reason })
    }))
}
