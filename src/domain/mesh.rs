//! The hosts-table mesh.
//!
//! Every node's `/etc/hosts` gets one line per node in the cluster,
//! including itself, so that nodes can resolve each other by name during
//! join.

use std::fmt;
use std::net::Ipv4Addr;

use super::id::NodeName;
use super::node::NodeSet;

/// Directed edge: append `source`'s entry to `target`'s hosts table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshEdge {
    /// Index of the node whose entry is written.
    pub source: usize,
    /// Index of the node whose hosts table is edited.
    pub target: usize,
}

impl MeshEdge {
    /// True for the edge writing a node's own entry.
    #[must_use]
    pub const fn is_self(&self) -> bool {
        self.source == self.target
    }
}

/// All ordered pairs over `nodes`, self-edges included, source-major.
#[must_use]
pub fn mesh_edges(nodes: &NodeSet) -> Vec<MeshEdge> {
    let n = nodes.len();
    (0..n)
        .flat_map(|source| (0..n).map(move |target| MeshEdge { source, target }))
        .collect()
}

/// One `/etc/hosts` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostsEntry {
    address: Ipv4Addr,
    name: NodeName,
}

impl HostsEntry {
    /// Entry mapping `name` to `address`.
    #[must_use]
    pub fn new(address: Ipv4Addr, name: NodeName) -> Self {
        Self { address, name }
    }

    /// Resolved address.
    #[must_use]
    pub const fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Host name.
    #[must_use]
    pub fn name(&self) -> &NodeName {
        &self.name
    }
}

impl fmt::Display for HostsEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.address, self.name)
    }
}

/// How a mesh edge ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// The entry is present on the target.
    Applied,
    /// The source never got an address, so there was nothing to write.
    Skipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_covers_every_ordered_pair() {
        let nodes = NodeSet::new(3, "node").unwrap();
        let edges = mesh_edges(&nodes);

        assert_eq!(edges.len(), 9);
        assert_eq!(edges.iter().filter(|e| e.is_self()).count(), 3);
        for source in 0..3 {
            for target in 0..3 {
                assert!(edges.contains(&MeshEdge { source, target }));
            }
        }
    }

    #[test]
    fn single_node_mesh_is_its_self_edge() {
        let nodes = NodeSet::new(1, "node").unwrap();
        assert_eq!(mesh_edges(&nodes), [MeshEdge { source: 0, target: 0 }]);
    }

    #[test]
    fn hosts_entry_renders_address_then_name() {
        let entry = HostsEntry::new(Ipv4Addr::new(10, 0, 0, 7), NodeName::new("node1"));
        assert_eq!(entry.to_string(), "10.0.0.7 node1");
    }
}
