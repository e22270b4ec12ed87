//! Linux isolation primitives
//!
//! This module contains the steps that build the sandbox:
//! - `namespace` - unshare of IPC, PID, UTS and mount namespaces
//! - `prune` - unmounting everything outside the new root
//! - `mounts` - the fixed set of virtual filesystems inside the root
//! - `chroot` - switching root and working directory
//! - `capabilities` - reduction to a fixed allow-list
//! - `sys` - the kernel calls the steps go through

pub mod capabilities;
pub mod chroot;
pub mod mounts;
pub mod namespace;
pub mod prune;
pub mod sys;

pub use self::capabilities::{CapabilityPlan, CapabilityStore};
pub use self::mounts::{MountSpec, MOUNTS};
pub use self::namespace::SANDBOX_NAMESPACES;
pub use self::prune::PruneList;
pub use self::sys::{LinuxHost, Syscalls};
