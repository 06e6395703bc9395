//! Outbound adapters (driven side).

pub mod shell;
pub mod state;
