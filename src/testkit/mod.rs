//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`multipass`] - [`FakeMultipass`](multipass::FakeMultipass), a scripted
//!   [`CommandExecutor`](crate::port::outbound::executor::CommandExecutor)
//!   that simulates VMs, hosts files and a microk8s master.

pub mod multipass;
