//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! - [`executor`] - Runs a command against a named target
//! - [`state`] - Persists applied operations and stack outputs

pub mod executor;
pub mod state;
