//! Command text for multipass and microk8s.
//!
//! Every command is a pure function of resolved inputs, so re-running with
//! the same inputs yields byte-identical text and the engine can recognise
//! operations that are already applied.

use std::net::Ipv4Addr;

use crate::domain::{HostsEntry, NodeName};

/// Shape of every launched VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmShape {
    /// Memory, e.g. `8G`.
    pub memory: String,
    /// Disk size, e.g. `20G`.
    pub disk: String,
    /// Image alias, e.g. `jammy`.
    pub image: String,
}

impl Default for VmShape {
    fn default() -> Self {
        Self {
            memory: "8G".into(),
            disk: "20G".into(),
            image: "jammy".into(),
        }
    }
}

/// Renders the commands the formation pipeline runs.
#[derive(Debug, Clone, Default)]
pub struct MultipassCommands {
    shape: VmShape,
}

impl MultipassCommands {
    /// Commands launching VMs of the given shape.
    #[must_use]
    pub const fn new(shape: VmShape) -> Self {
        Self { shape }
    }

    #[must_use]
    pub fn purge(&self, node: &NodeName) -> String {
        format!("multipass delete --purge {node}")
    }

    #[must_use]
    pub fn purge_all(&self) -> String {
        "multipass purge".to_string()
    }

    #[must_use]
    pub fn launch(&self, node: &NodeName) -> String {
        format!(
            "multipass launch -m {} -n {node} -d {} {}",
            self.shape.memory, self.shape.disk, self.shape.image
        )
    }

    #[must_use]
    pub fn delete(&self, node: &NodeName) -> String {
        format!("multipass delete {node}")
    }

    #[must_use]
    pub fn info(&self, node: &NodeName) -> String {
        format!("multipass info {node} --format json")
    }

    /// Append `entry` to the target's hosts file unless the exact line is
    /// already present.
    #[must_use]
    pub fn add_host(&self, target: &NodeName, entry: &HostsEntry) -> String {
        format!(
            "multipass exec {target} -- sudo /bin/sh -c \"grep -qxF '{entry}' /etc/hosts || echo '{entry}' >> /etc/hosts\""
        )
    }

    #[must_use]
    pub fn install_runtime(&self, node: &NodeName) -> String {
        format!("multipass exec {node} -- sudo snap install microk8s --classic")
    }

    #[must_use]
    pub fn kube_config(&self, master: &NodeName) -> String {
        format!("multipass exec {master} -- sudo microk8s config")
    }

    #[must_use]
    pub fn enable_load_balancer(&self, master: &NodeName, address: Ipv4Addr) -> String {
        format!("multipass exec {master} -- sudo microk8s enable metallb:{address}/32")
    }

    #[must_use]
    pub fn add_node(&self, master: &NodeName) -> String {
        format!("multipass exec {master} -- sudo microk8s add-node")
    }

    /// Run the join line printed by `add-node` on the worker.
    #[must_use]
    pub fn join(&self, worker: &NodeName, join_line: &str) -> String {
        format!("multipass exec {worker} -- sudo {join_line}")
    }

    #[must_use]
    pub fn leave(&self, worker: &NodeName) -> String {
        format!("multipass exec {worker} -- sudo microk8s leave")
    }
}

/// Operation names. They key the state file, so they must stay stable.
pub mod names {
    use crate::domain::NodeName;

    pub fn purge(node: &NodeName) -> String {
        format!("{node}Purge")
    }

    pub fn create(node: &NodeName) -> String {
        format!("{node}Create")
    }

    pub fn get_ip(node: &NodeName) -> String {
        format!("{node}GetIp")
    }

    pub fn host(source: &NodeName, target: &NodeName) -> String {
        format!("host{source}To{target}")
    }

    pub fn install(node: &NodeName) -> String {
        format!("{node}InstallMicrok8s")
    }

    pub const KUBE_CONFIG: &str = "kubeConfig";

    pub const METALLB: &str = "metallb";

    pub fn join_command(node: &NodeName) -> String {
        format!("{node}JoinCommand")
    }

    pub fn join(node: &NodeName) -> String {
        format!("{node}Join")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> NodeName {
        NodeName::new(name)
    }

    #[test]
    fn launch_uses_vm_shape() {
        let commands = MultipassCommands::new(VmShape {
            memory: "4G".into(),
            disk: "10G".into(),
            image: "noble".into(),
        });
        assert_eq!(
            commands.launch(&node("microk8s-node1")),
            "multipass launch -m 4G -n microk8s-node1 -d 10G noble"
        );
    }

    #[test]
    fn default_shape_matches_reference_cluster() {
        let commands = MultipassCommands::default();
        assert_eq!(
            commands.launch(&node("microk8s-node0")),
            "multipass launch -m 8G -n microk8s-node0 -d 20G jammy"
        );
    }

    #[test]
    fn hosts_append_is_guarded() {
        let commands = MultipassCommands::default();
        let entry = HostsEntry::new(Ipv4Addr::new(10, 0, 0, 2), node("microk8s-node1"));
        let command = commands.add_host(&node("microk8s-node0"), &entry);

        assert!(command.starts_with("multipass exec microk8s-node0 -- sudo /bin/sh -c"));
        assert!(command.contains("grep -qxF '10.0.0.2 microk8s-node1' /etc/hosts"));
        assert!(command.contains("echo '10.0.0.2 microk8s-node1' >> /etc/hosts"));
    }

    #[test]
    fn master_commands() {
        let commands = MultipassCommands::default();
        let master = node("microk8s-node0");
        assert_eq!(
            commands.enable_load_balancer(&master, Ipv4Addr::new(10, 0, 0, 1)),
            "multipass exec microk8s-node0 -- sudo microk8s enable metallb:10.0.0.1/32"
        );
        assert_eq!(
            commands.add_node(&master),
            "multipass exec microk8s-node0 -- sudo microk8s add-node"
        );
    }

    #[test]
    fn join_runs_token_line_on_worker() {
        let commands = MultipassCommands::default();
        assert_eq!(
            commands.join(&node("w1"), "microk8s join 10.0.0.1:25000/abc"),
            "multipass exec w1 -- sudo microk8s join 10.0.0.1:25000/abc"
        );
        assert_eq!(
            commands.leave(&node("w1")),
            "multipass exec w1 -- sudo microk8s leave"
        );
    }

    #[test]
    fn operation_names() {
        let a = node("microk8s-node0");
        let b = node("microk8s-node1");
        assert_eq!(names::purge(&a), "microk8s-node0Purge");
        assert_eq!(names::host(&a, &b), "hostmicrok8s-node0Tomicrok8s-node1");
        assert_eq!(names::join_command(&b), "microk8s-node1JoinCommand");
    }
}
