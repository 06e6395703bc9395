//! Domain types for cluster formation.
//!
//! Everything in here is pure: node identities, the hosts mesh, join tokens
//! and their parsing, the join state machine, and the persisted stack state.
//! Nothing in this module performs I/O.
//!
//! - [`node`] - Node identities and the immutable [`NodeSet`](node::NodeSet)
//! - [`address`] - Parsing a node's IPv4 address from VM info output
//! - [`mesh`] - Hosts-table edges between every ordered pair of nodes
//! - [`token`] - Join token extraction from `add-node` output
//! - [`join`] - Per-worker join state machine
//! - [`secret`] - Redacting wrapper for sensitive values
//! - [`state`] - Persisted operation records and stack outputs
//! - [`error`] - Domain and formation error kinds

pub mod address;
pub mod error;
pub mod id;
pub mod join;
pub mod mesh;
pub mod node;
pub mod secret;
pub mod state;
pub mod token;

pub use error::{DomainError, FormationError, MalformedOutputError};
pub use id::NodeName;
pub use join::JoinState;
pub use mesh::{EdgeOutcome, HostsEntry, MeshEdge};
pub use node::{Node, NodeSet};
pub use secret::{ClusterCredential, Secret};
pub use state::{ClusterOutputs, OperationRecord, StackState};
pub use token::JoinToken;
