//! Implementations of ports (hexagonal adapters).
//!
//! - [`inbound`] - Command-line interface driving the orchestrator
//! - [`outbound`] - Shell execution and state persistence

pub mod inbound;
pub mod outbound;
