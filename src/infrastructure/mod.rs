//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! formation logic: configuration loading and the composition root that
//! wires adapters into the orchestrator.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation

pub mod bootstrap;
pub mod config;
