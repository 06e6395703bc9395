//! Scripted stand-in for multipass and microk8s.
//!
//! [`FakeMultipass`] implements [`CommandExecutor`] and interprets the exact
//! commands the formation pipeline renders: it keeps a table of VMs with
//! addresses and hosts files, tracks runtime installs and cluster
//! membership, and mints a fresh join token for every `add-node`.
//!
//! Failures can be injected per node: a failing launch, a custom info
//! payload, a failing join, or a fixed `add-node` output.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;
use crate::port::outbound::executor::{CommandExecutor, CommandOutput};

const KUBECONFIG: &str = "apiVersion: v1\nclusters:\n- cluster:\n    server: https://{address}:16443\n  name: microk8s-cluster\nusers:\n- name: admin\n  user:\n    token: fake-admin-token\n";

#[derive(Debug)]
struct Vm {
    address: Ipv4Addr,
    hosts: Vec<String>,
    installed: bool,
    joined: bool,
}

#[derive(Debug, Default)]
struct Inner {
    vms: BTreeMap<String, Vm>,
    next_host: u8,
    executed: Vec<(String, String)>,
    tokens_issued: Vec<String>,
    tokens_used: HashSet<String>,
    load_balancer: Option<String>,
    info_overrides: HashMap<String, String>,
    launch_failures: HashSet<String>,
    join_failures: HashSet<String>,
    add_node_output: Option<String>,
}

/// In-memory multipass with a microk8s master.
#[derive(Debug, Clone, Default)]
pub struct FakeMultipass {
    inner: Arc<Mutex<Inner>>,
}

impl FakeMultipass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `multipass info <node>` with `payload`.
    #[must_use]
    pub fn with_info_payload(self, node: &str, payload: &str) -> Self {
        self.inner
            .lock()
            .info_overrides
            .insert(node.to_string(), payload.to_string());
        self
    }

    /// Make `multipass launch` fail for `node`.
    #[must_use]
    pub fn fail_launch(self, node: &str) -> Self {
        self.inner.lock().launch_failures.insert(node.to_string());
        self
    }

    /// Make `microk8s join` fail on `node`.
    #[must_use]
    pub fn fail_join(self, node: &str) -> Self {
        self.inner.lock().join_failures.insert(node.to_string());
        self
    }

    /// Answer every `add-node` with `output` instead of a fresh token.
    #[must_use]
    pub fn with_add_node_output(self, output: &str) -> Self {
        self.inner.lock().add_node_output = Some(output.to_string());
        self
    }

    /// Stop injecting failures and overrides, keep the VMs.
    pub fn heal(&self) {
        let mut inner = self.inner.lock();
        inner.info_overrides.clear();
        inner.launch_failures.clear();
        inner.join_failures.clear();
        inner.add_node_output = None;
    }

    /// Every command run so far, in order.
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        self.inner
            .lock()
            .executed
            .iter()
            .map(|(_, command)| command.clone())
            .collect()
    }

    /// Number of commands run so far that contain `needle`.
    #[must_use]
    pub fn count(&self, needle: &str) -> usize {
        self.inner
            .lock()
            .executed
            .iter()
            .filter(|(_, command)| command.contains(needle))
            .count()
    }

    /// Position of the first command containing `needle`.
    #[must_use]
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.inner
            .lock()
            .executed
            .iter()
            .position(|(_, command)| command.contains(needle))
    }

    /// Targets of the commands run so far that contain `needle`.
    #[must_use]
    pub fn targets_of(&self, needle: &str) -> Vec<String> {
        self.inner
            .lock()
            .executed
            .iter()
            .filter(|(_, command)| command.contains(needle))
            .map(|(target, _)| target.clone())
            .collect()
    }

    /// Names of the VMs that currently exist.
    #[must_use]
    pub fn vms(&self) -> Vec<String> {
        self.inner.lock().vms.keys().cloned().collect()
    }

    /// Address assigned to `node`.
    #[must_use]
    pub fn address(&self, node: &str) -> Option<Ipv4Addr> {
        self.inner.lock().vms.get(node).map(|vm| vm.address)
    }

    /// Lines of `node`'s hosts file written by the pipeline.
    #[must_use]
    pub fn hosts(&self, node: &str) -> Vec<String> {
        self.inner
            .lock()
            .vms
            .get(node)
            .map(|vm| vm.hosts.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_installed(&self, node: &str) -> bool {
        self.inner.lock().vms.get(node).is_some_and(|vm| vm.installed)
    }

    #[must_use]
    pub fn is_joined(&self, node: &str) -> bool {
        self.inner.lock().vms.get(node).is_some_and(|vm| vm.joined)
    }

    /// Join lines minted by `add-node`, in order.
    #[must_use]
    pub fn tokens_issued(&self) -> Vec<String> {
        self.inner.lock().tokens_issued.clone()
    }

    /// Argument of the last `microk8s enable metallb:...`.
    #[must_use]
    pub fn load_balancer(&self) -> Option<String> {
        self.inner.lock().load_balancer.clone()
    }
}

#[async_trait]
impl CommandExecutor for FakeMultipass {
    fn name(&self) -> &'static str {
        "fake-multipass"
    }

    async fn run(&self, target: &str, command: &str) -> Result<CommandOutput> {
        // Give other operations a chance to interleave like real processes.
        tokio::task::yield_now().await;

        let mut inner = self.inner.lock();
        inner
            .executed
            .push((target.to_string(), command.to_string()));
        Ok(inner.apply(command))
    }
}

impl Inner {
    fn apply(&mut self, command: &str) -> CommandOutput {
        let Some(rest) = command.strip_prefix("multipass ") else {
            return unknown(command);
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        match args.as_slice() {
            ["delete", "--purge", name] => self.purge(name),
            ["purge"] => CommandOutput::ok(""),
            ["launch", "-m", _, "-n", name, "-d", _, _] => self.launch(name),
            ["delete", name] => match self.vms.remove(*name) {
                Some(_) => CommandOutput::ok(""),
                None => CommandOutput::failed(2, format!("instance \"{name}\" does not exist")),
            },
            ["info", name, "--format", "json"] => self.info(name),
            ["exec", name, "--", "sudo", ..] => {
                let inside = rest
                    .split_once("-- sudo ")
                    .map(|(_, inside)| inside)
                    .unwrap_or_default();
                self.exec(name, inside)
            }
            _ => unknown(command),
        }
    }

    fn purge(&mut self, name: &str) -> CommandOutput {
        match self.vms.remove(name) {
            Some(_) => CommandOutput::ok(""),
            None => CommandOutput::failed(2, format!("instance \"{name}\" does not exist")),
        }
    }

    fn launch(&mut self, name: &str) -> CommandOutput {
        if self.launch_failures.contains(name) {
            return CommandOutput::failed(2, "launch failed: Remote \"\" is unknown or unreachable.");
        }
        if self.vms.contains_key(name) {
            return CommandOutput::failed(2, format!("instance \"{name}\" already exists"));
        }

        self.next_host += 1;
        let vm = Vm {
            address: Ipv4Addr::new(10, 0, 0, 10 + self.next_host),
            hosts: Vec::new(),
            installed: false,
            joined: false,
        };
        self.vms.insert(name.to_string(), vm);
        CommandOutput::ok(format!("Launched: {name}\n"))
    }

    fn info(&self, name: &str) -> CommandOutput {
        if let Some(payload) = self.info_overrides.get(name) {
            return CommandOutput::ok(payload.clone());
        }
        match self.vms.get(name) {
            Some(vm) => CommandOutput::ok(
                serde_json::json!({
                    "errors": [],
                    "info": {
                        name: {
                            "ipv4": [vm.address.to_string()],
                            "release": "Ubuntu 22.04 LTS",
                            "state": "Running",
                        }
                    }
                })
                .to_string(),
            ),
            None => CommandOutput::failed(2, format!("instance \"{name}\" does not exist")),
        }
    }

    fn exec(&mut self, name: &str, inside: &str) -> CommandOutput {
        if !self.vms.contains_key(name) {
            return CommandOutput::failed(2, format!("instance \"{name}\" does not exist"));
        }

        if inside.starts_with("/bin/sh -c") {
            return self.add_host(name, inside);
        }
        if inside == "snap install microk8s --classic" {
            if let Some(vm) = self.vms.get_mut(name) {
                vm.installed = true;
            }
            return CommandOutput::ok("microk8s (1.28/stable) v1.28.3 from Canonical installed\n");
        }

        let installed = self.vms.get(name).is_some_and(|vm| vm.installed);
        let Some(microk8s) = inside.strip_prefix("microk8s ") else {
            return unknown(inside);
        };
        if !installed {
            return CommandOutput::failed(127, "microk8s: command not found");
        }

        match microk8s.split_whitespace().collect::<Vec<_>>().as_slice() {
            ["config"] => {
                let address = self.vms.get(name).map(|vm| vm.address.to_string());
                CommandOutput::ok(KUBECONFIG.replace("{address}", &address.unwrap_or_default()))
            }
            ["enable", addon] if addon.starts_with("metallb:") => {
                self.load_balancer = Some(addon.trim_start_matches("metallb:").to_string());
                CommandOutput::ok("MetalLB is enabled\n")
            }
            ["add-node"] => self.add_node(),
            ["join", endpoint, ..] => self.join(name, endpoint),
            ["leave"] => {
                if let Some(vm) = self.vms.get_mut(name) {
                    vm.joined = false;
                }
                CommandOutput::ok("Generating new cluster certificates.\n")
            }
            _ => unknown(inside),
        }
    }

    fn add_host(&mut self, name: &str, script: &str) -> CommandOutput {
        // grep -qxF '<line>' /etc/hosts || echo '<line>' >> /etc/hosts
        let Some(line) = script.split('\'').nth(1) else {
            return unknown(script);
        };
        if let Some(vm) = self.vms.get_mut(name) {
            if !vm.hosts.iter().any(|existing| existing == line) {
                vm.hosts.push(line.to_string());
            }
        }
        CommandOutput::ok("")
    }

    fn add_node(&mut self) -> CommandOutput {
        if let Some(output) = &self.add_node_output {
            return CommandOutput::ok(output.clone());
        }

        let n = self.tokens_issued.len() + 1;
        let master = self
            .vms
            .values()
            .find(|vm| vm.installed)
            .map(|vm| vm.address.to_string())
            .unwrap_or_default();
        let join = format!("microk8s join {master}:25000/token{n:04}/abc{n}");
        self.tokens_issued.push(join.clone());

        CommandOutput::ok(format!(
            "From the node you wish to join to this cluster, run the following:\n{join}\n\n\
             Use the '--worker' flag to join a node as a worker not running the control plane, eg:\n\
             {join} --worker\n"
        ))
    }

    fn join(&mut self, name: &str, endpoint: &str) -> CommandOutput {
        if self.join_failures.contains(name) {
            return CommandOutput::failed(1, "Connection failed. Invalid token (500).");
        }
        if !self.tokens_used.insert(endpoint.to_string()) {
            return CommandOutput::failed(1, "Connection failed. Invalid token (500).");
        }
        if let Some(vm) = self.vms.get_mut(name) {
            vm.joined = true;
        }
        CommandOutput::ok("Contacting cluster at 10.0.0.11\nWaiting for this node to finish joining the cluster.\n")
    }
}

fn unknown(command: &str) -> CommandOutput {
    CommandOutput::failed(127, format!("unknown command: {command}"))
}
