//! CLI module graph.

pub mod command;
pub mod config;
pub mod context;
pub mod destroy;
pub mod output;
pub mod outputs;
pub mod paths;
pub mod plan;
pub mod report;
pub mod up;

pub use context::Context;
