//! Application services (use cases).
//!
//! The formation pipeline declares operations on an in-process engine and
//! wires them together with deferred values; the orchestrator ties the
//! pipeline to the state store and produces reports.
//!
//! - [`deferred`] - Shared futures with operation lineage
//! - [`engine`] - Operation graph execution and replay
//! - [`commands`] - Command text and operation names
//! - [`formation`] - Provision, resolve, mesh, install, join
//! - [`report`] - Formation report assembled after a run
//! - [`teardown`] - Reverse-order destroy of recorded operations
//! - [`orchestrator`] - `up`, `plan`, `destroy` and `outputs`

pub mod commands;
pub mod deferred;
pub mod engine;
pub mod formation;
pub mod orchestrator;
pub mod report;
pub mod teardown;

pub use commands::{MultipassCommands, VmShape};
pub use deferred::{Deferred, Outcome};
pub use engine::{Engine, EngineRun, OperationReport, OperationSpec, OperationStatus, PlannedOperation, Resource};
pub use orchestrator::Orchestrator;
pub use report::{FormationReport, NodeReport};
pub use teardown::TeardownReport;
