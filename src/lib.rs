//! Clusterforge - microk8s cluster formation on local multipass VMs.
//!
//! This crate provisions a set of VMs, discovers their addresses, writes a
//! full hosts-file mesh across them, installs microk8s everywhere and joins
//! every worker to the master with a single-use token minted on the master.
//!
//! # Architecture
//!
//! Every step is an operation in a dependency graph run by a small
//! in-process engine:
//!
//! - **`application::engine`** - Declares operations with paired create and
//!   delete commands, runs independent ones concurrently, serializes
//!   commands per target and replays applied operations from state
//! - **`application::deferred`** - Shared, composable values that resolve
//!   once an operation's output is known
//! - **`application::formation`** - The provisioning, address, mesh,
//!   install and join stages declared against the engine
//!
//! # Modules
//!
//! - [`domain`] - Node identities, hosts mesh, join tokens, stack state
//! - [`port`] - Command executor and state store traits
//! - [`adapter`] - CLI, local shell executor, JSON state file
//! - [`application`] - Engine, formation graph, teardown, orchestrator
//! - [`infrastructure`] - Configuration, logging and wiring
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use clusterforge::infrastructure::bootstrap;
//! use clusterforge::infrastructure::config::settings::Config;
//!
//! # async fn run() -> clusterforge::error::Result<()> {
//! let config = Config::default();
//! let orchestrator = bootstrap::build_orchestrator(&config, "state.json".as_ref());
//! let report = orchestrator.up(3).await?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
