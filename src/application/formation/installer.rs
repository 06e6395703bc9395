//! Runtime install and master post-install steps.

use std::net::Ipv4Addr;

use super::graph::classify;
use crate::application::commands::{names, MultipassCommands};
use crate::application::deferred::{Deferred, Outcome};
use crate::application::engine::{Engine, OperationSpec};
use crate::domain::{ClusterCredential, FormationError, Node, NodeName};
use crate::error::Result;

/// Declare the runtime install on `node`, which only needs the VM.
pub fn install(
    engine: &mut Engine,
    commands: &MultipassCommands,
    node: &Node,
    created: &Deferred<()>,
) -> Result<Deferred<()>> {
    let name = node.name();
    let resource = engine.declare(
        OperationSpec::command(
            names::install(name),
            name.as_str(),
            commands.install_runtime(name),
        )
        .depends_on(created),
    )?;

    let node = name.clone();
    Ok(resource
        .done()
        .map_err(move |e| classify(e, |reason| FormationError::InstallFailure { node, reason })))
}

/// What the master exposes once installed.
#[derive(Debug, Clone)]
pub struct MasterOutputs {
    /// Admin kubeconfig.
    pub credential: Deferred<ClusterCredential>,
    /// Load balancer enabled on the master address.
    pub load_balancer: Deferred<()>,
}

/// Declare the credential export and the load balancer on the master.
pub fn configure_master(
    engine: &mut Engine,
    commands: &MultipassCommands,
    master: &Node,
    installed: &Deferred<()>,
    address: &Deferred<Ipv4Addr>,
) -> Result<MasterOutputs> {
    let name = master.name();

    let checked = name.clone();
    let config = engine.declare(
        OperationSpec::command(names::KUBE_CONFIG, name.as_str(), commands.kube_config(name))
            .secret()
            .depends_on(installed)
            .check_output(move |output| credential_of(&checked, output).map(drop)),
    )?;
    let node = name.clone();
    let credential = config.stdout().settle(move |result| {
        let output = result
            .map_err(|e| classify(e, |reason| FormationError::InstallFailure { node: node.clone(), reason }))?;
        credential_of(&node, &output)
    });

    let enable = {
        let commands = commands.clone();
        let name = name.clone();
        address.map(move |address| commands.enable_load_balancer(&name, address))
    };
    let metallb = engine.declare(
        OperationSpec::new(names::METALLB, name.as_str(), enable).depends_on(installed),
    )?;
    let node = name.clone();
    let load_balancer = metallb
        .done()
        .map_err(move |e| classify(e, |reason| FormationError::InstallFailure { node, reason }));

    Ok(MasterOutputs {
        credential,
        load_balancer,
    })
}

fn credential_of(node: &NodeName, output: &str) -> Outcome<ClusterCredential> {
    ClusterCredential::from_output(output).map_err(|e| FormationError::InstallFailure {
        node: node.clone(),
        reason: e.to_string(),
    })
}
