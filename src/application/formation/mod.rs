//! Cluster formation pipeline.
//!
//! Declares, for a fixed `NodeSet`, every operation needed to go from
//! nothing to a formed cluster:
//!
//! ```text
//! purge -> create -> get ip ----> mesh edges (N x N) --+
//!            |                                          +--> join command -> join
//!            +-> install (master: kubeConfig, metallb) -+
//! ```
//!
//! Nothing runs while declaring; the engine drives the graph afterwards and
//! the handles returned here resolve as operations complete.

pub mod graph;
pub mod installer;
pub mod joiner;
pub mod mesh;
pub mod provisioner;
pub mod resolver;

pub use graph::{declare, FormationGraph, NodeHandles};
pub use joiner::{JoinGate, JoinTracker, TokenLedger};
