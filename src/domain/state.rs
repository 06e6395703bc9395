//! Persisted stack state.
//!
//! The state file remembers every operation that was applied, the command it
//! ran, its captured stdout and its delete counterpart. A re-run replays
//! recorded outputs instead of re-executing, and `destroy` walks the records
//! in reverse dependency order.

use std::fmt;
use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::secret::ClusterCredential;

/// Current on-disk format version.
pub const STATE_VERSION: u32 = 1;

/// One applied operation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Unique operation name.
    pub name: String,
    /// Node (or host) the command runs against.
    pub target: String,
    /// Command that was executed.
    pub create: String,
    /// Command that undoes it, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,
    /// Names of operations this one depended on.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Captured stdout.
    #[serde(default)]
    pub stdout: String,
    /// Whether stdout and the command text must be kept out of logs and
    /// terminal output.
    #[serde(default)]
    pub secret: bool,
    /// Whether a non-zero exit of the delete command is acceptable.
    #[serde(default)]
    pub ignore_failure: bool,
    /// When the create command completed.
    pub applied_at: DateTime<Utc>,
}

impl fmt::Debug for OperationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &String| -> String {
            if self.secret {
                "[secret]".to_string()
            } else {
                format!("{value:?}")
            }
        };
        let create = redact(&self.create);
        let stdout = redact(&self.stdout);
        f.debug_struct("OperationRecord")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("create", &format_args!("{create}"))
            .field("delete", &self.delete)
            .field("depends_on", &self.depends_on)
            .field("stdout", &format_args!("{stdout}"))
            .field("applied_at", &self.applied_at)
            .finish()
    }
}

/// Outputs exposed to downstream consumers such as a services layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOutputs {
    /// Admin kubeconfig of the master.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_credential: Option<ClusterCredential>,
    /// Address of the master node, also the load balancer address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_address: Option<Ipv4Addr>,
}

impl ClusterOutputs {
    /// True when neither output is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cluster_credential.is_none() && self.master_address.is_none()
    }
}

/// Everything the state store persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackState {
    /// Format version.
    pub version: u32,
    /// Applied operations in completion order.
    #[serde(default)]
    pub operations: Vec<OperationRecord>,
    /// Last known outputs.
    #[serde(default)]
    pub outputs: ClusterOutputs,
}

impl Default for StackState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            operations: Vec::new(),
            outputs: ClusterOutputs::default(),
        }
    }
}

impl StackState {
    /// Find a record by operation name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OperationRecord> {
        self.operations.iter().find(|record| record.name == name)
    }

    /// True when `name` has been applied.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace a record, keeping the position of a replaced one.
    pub fn upsert(&mut self, record: OperationRecord) {
        match self.operations.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => self.operations.push(record),
        }
    }

    /// True when nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, stdout: &str, secret: bool) -> OperationRecord {
        OperationRecord {
            name: name.into(),
            target: "microk8s-node0".into(),
            create: format!("echo {name}"),
            delete: None,
            depends_on: vec![],
            stdout: stdout.into(),
            secret,
            ignore_failure: false,
            applied_at: Utc::now(),
        }
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut state = StackState::default();
        state.upsert(record("a", "1", false));
        state.upsert(record("b", "2", false));
        state.upsert(record("a", "3", false));

        let names: Vec<_> = state.operations.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(state.get("a").map(|r| r.stdout.as_str()), Some("3"));
    }

    #[test]
    fn secret_stdout_is_redacted_in_debug() {
        let secret = record("kubeConfig", "client-key-data: abc", true);
        assert!(!format!("{secret:?}").contains("client-key-data"));

        let plain = record("node0GetIp", "10.0.0.1", false);
        assert!(format!("{plain:?}").contains("10.0.0.1"));
    }

    #[test]
    fn secret_command_is_redacted_in_debug() {
        let mut join = record("microk8s-node1Join", "", true);
        join.create = "microk8s join 10.0.0.1:25000/0123abcd".into();
        let shown = format!("{join:?}");
        assert!(!shown.contains("0123abcd"), "{shown}");
        assert!(shown.contains("microk8s-node1Join"));
    }

    #[test]
    fn outputs_use_camel_case_keys() {
        let outputs = ClusterOutputs {
            cluster_credential: None,
            master_address: Some(Ipv4Addr::new(10, 0, 0, 1)),
        };
        let json = serde_json::to_value(&outputs).unwrap();
        assert_eq!(json["masterAddress"], "10.0.0.1");
        assert!(json.get("clusterCredential").is_none());
    }
}
