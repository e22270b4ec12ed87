//! Kernel entry points used by the child setup steps
//!
//! The steps are written against these traits so tests can record the
//! calls in order; [`LinuxHost`] forwards them to the real syscalls.

use super::capabilities::CapabilityStore;
use super::mounts::MountSpec;
use caps::errors::CapsError;
use caps::{CapSet, Capability, CapsHashSet};
use std::path::Path;

/// Mount table and root syscalls
pub trait Syscalls {
    fn mount(&mut self, spec: &MountSpec, target: &Path) -> nix::Result<()>;
    fn umount(&mut self, target: &Path) -> nix::Result<()>;
    fn chroot(&mut self, path: &Path) -> nix::Result<()>;
    fn chdir(&mut self, path: &Path) -> nix::Result<()>;
}

/// The calling process, as seen by the kernel
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxHost;

impl Syscalls for LinuxHost {
    fn mount(&mut self, spec: &MountSpec, target: &Path) -> nix::Result<()> {
        nix::mount::mount(
            Some(spec.source),
            target,
            Some(spec.fstype),
            spec.flags,
            spec.options,
        )
    }

    fn umount(&mut self, target: &Path) -> nix::Result<()> {
        nix::mount::umount(target)
    }

    fn chroot(&mut self, path: &Path) -> nix::Result<()> {
        nix::unistd::chroot(path)
    }

    fn chdir(&mut self, path: &Path) -> nix::Result<()> {
        nix::unistd::chdir(path)
    }
}

impl CapabilityStore for LinuxHost {
    fn read(&self, set: CapSet) -> Result<CapsHashSet, CapsError> {
        caps::read(None, set)
    }

    fn drop_bounding(&mut self, cap: Capability) -> Result<(), CapsError> {
        caps::drop(None, CapSet::Bounding, cap)
    }

    fn set(&mut self, set: CapSet, value: &CapsHashSet) -> Result<(), CapsError> {
        caps::set(None, set, value)
    }
}
