//! Node identities.
//!
//! Identities are materialized up front for every requested index and never
//! change afterwards. The dependency graph is then built over this fixed set
//! by index, so nothing is mutated while wiring cross-node references.

use super::error::DomainError;
use super::id::NodeName;

/// One VM participating in the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: NodeName,
    index: usize,
    is_master: bool,
}

impl Node {
    /// Deterministic node name, also used as the VM instance name.
    #[must_use]
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// Position in creation order.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// True only for the first node; it issues join tokens and holds the
    /// cluster credential.
    #[must_use]
    pub const fn is_master(&self) -> bool {
        self.is_master
    }
}

/// The fixed, ordered set of cluster nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSet {
    nodes: Vec<Node>,
}

impl NodeSet {
    /// Build `count` nodes named `<prefix><index>`; index 0 is the master.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::EmptyCluster`] when `count` is zero and
    /// [`DomainError::InvalidNodePrefix`] when the prefix cannot be used
    /// as a hostname.
    pub fn new(count: usize, prefix: &str) -> Result<Self, DomainError> {
        if count == 0 {
            return Err(DomainError::EmptyCluster);
        }
        validate_prefix(prefix)?;

        let nodes = (0..count)
            .map(|index| Node {
                name: NodeName::new(format!("{prefix}{index}")),
                index,
                is_master: index == 0,
            })
            .collect();

        Ok(Self { nodes })
    }

    /// The master node.
    #[must_use]
    pub fn master(&self) -> &Node {
        &self.nodes[0]
    }

    /// All nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Look a node up by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a `NodeSet` holds at least the master.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn validate_prefix(prefix: &str) -> Result<(), DomainError> {
    let invalid = |reason| DomainError::InvalidNodePrefix {
        prefix: prefix.to_string(),
        reason,
    };

    if prefix.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if !prefix.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(invalid("must start with a letter"));
    }
    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(invalid("only letters, digits and '-' are allowed"));
    }
    Ok(())
}
