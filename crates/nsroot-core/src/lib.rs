//! # nsroot-core
//!
//! Builds a sandbox around a single executable:
//! - fresh IPC, PID, UTS and mount namespaces via unshare
//! - pruning of every mount that lives outside the new root
//! - a fixed set of virtual filesystems mounted inside the root
//! - chroot into the root
//! - a fixed capability allow-list in the bounding, effective and permitted sets
//!
//! [`Supervisor`] drives the whole sequence and mirrors the child's exit.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod isolation;
pub mod plan;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{SandboxConfig, SandboxRoot};
pub use error::NsrootError;
pub use plan::SandboxPlan;
pub use supervisor::{ChildTermination, Failure, Role, Supervisor};

/// Crate-level result type
pub type Result<T> = std::result::Result<T, NsrootError>;
