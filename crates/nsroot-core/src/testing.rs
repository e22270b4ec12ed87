//! In-memory stand-ins for the kernel used by unit tests

use crate::isolation::capabilities::CapabilityStore;
use crate::isolation::mounts::MountSpec;
use crate::isolation::sys::Syscalls;
use caps::errors::CapsError;
use caps::{CapSet, Capability, CapsHashSet};
use nix::errno::Errno;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Mount {
        source: &'static str,
        target: PathBuf,
        fstype: &'static str,
        options: Option<&'static str>,
    },
    Umount(PathBuf),
    Chroot(PathBuf),
    Chdir(PathBuf),
    DropBounding(Capability),
    /// Debug name of the set, `CapSet` has no `PartialEq`
    SetCaps(String),
}

/// Records every call and fails the ones it is told to
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<Call>,
    mounts: usize,
    fail_mount_at: Option<(usize, Errno)>,
    fail_umount: Vec<(PathBuf, Errno)>,
    fail_chroot: Option<Errno>,
    fail_caps: Option<String>,
}

impl Recorder {
    /// Fail the `index`th mount call (zero based)
    pub fn fail_mount_at(mut self, index: usize, errno: Errno) -> Self {
        self.fail_mount_at = Some((index, errno));
        self
    }

    pub fn fail_umount(mut self, path: &str, errno: Errno) -> Self {
        self.fail_umount.push((PathBuf::from(path), errno));
        self
    }

    pub fn fail_chroot(mut self, errno: Errno) -> Self {
        self.fail_chroot = Some(errno);
        self
    }

    pub fn fail_caps(mut self, message: &str) -> Self {
        self.fail_caps = Some(message.to_string());
        self
    }
}

impl Syscalls for Recorder {
    fn mount(&mut self, spec: &MountSpec, target: &Path) -> nix::Result<()> {
        self.calls.push(Call::Mount {
            source: spec.source,
            target: target.to_path_buf(),
            fstype: spec.fstype,
            options: spec.options,
        });
        let index = self.mounts;
        self.mounts += 1;
        match self.fail_mount_at {
            Some((at, errno)) if at == index => Err(errno),
            _ => Ok(()),
        }
    }

    fn umount(&mut self, target: &Path) -> nix::Result<()> {
        self.calls.push(Call::Umount(target.to_path_buf()));
        match self.fail_umount.iter().find(|(path, _)| path == target) {
            Some((_, errno)) => Err(*errno),
            None => Ok(()),
        }
    }

    fn chroot(&mut self, path: &Path) -> nix::Result<()> {
        self.calls.push(Call::Chroot(path.to_path_buf()));
        self.fail_chroot.map_or(Ok(()), Err)
    }

    fn chdir(&mut self, path: &Path) -> nix::Result<()> {
        self.calls.push(Call::Chdir(path.to_path_buf()));
        Ok(())
    }
}

impl CapabilityStore for Recorder {
    fn read(&self, _set: CapSet) -> Result<CapsHashSet, CapsError> {
        Ok(caps::all())
    }

    fn drop_bounding(&mut self, cap: Capability) -> Result<(), CapsError> {
        self.calls.push(Call::DropBounding(cap));
        Ok(())
    }

    fn set(&mut self, set: CapSet, _value: &CapsHashSet) -> Result<(), CapsError> {
        self.calls.push(Call::SetCaps(format!("{set:?}")));
        match &self.fail_caps {
            Some(message) => Err(CapsError::from(message.as_str())),
            None => Ok(()),
        }
    }
}

/// Tracks the root and working directory as host paths.
///
/// Only absolute arguments are supported; they resolve against the
/// current root the way the kernel does.
#[derive(Debug)]
pub struct TwoRoots {
    pub root: PathBuf,
    pub cwd: PathBuf,
}

impl Default for TwoRoots {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            cwd: PathBuf::from("/"),
        }
    }
}

impl TwoRoots {
    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path.strip_prefix("/").unwrap_or(path))
    }

    pub fn cwd_inside_root(&self) -> bool {
        self.cwd.starts_with(&self.root)
    }
}

impl Syscalls for TwoRoots {
    fn mount(&mut self, _spec: &MountSpec, _target: &Path) -> nix::Result<()> {
        Ok(())
    }

    fn umount(&mut self, _target: &Path) -> nix::Result<()> {
        Ok(())
    }

    fn chroot(&mut self, path: &Path) -> nix::Result<()> {
        self.root = self.resolve(path);
        Ok(())
    }

    fn chdir(&mut self, path: &Path) -> nix::Result<()> {
        self.cwd = self.resolve(path);
        Ok(())
    }
}

/// Capability sets with the kernel's capset(2) rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeCaps {
    pub bounding: CapsHashSet,
    pub effective: CapsHashSet,
    pub permitted: CapsHashSet,
    pub inheritable: CapsHashSet,
    pub log: Vec<String>,
}

impl FakeCaps {
    /// A root process: every capability in every set but inheritable
    pub fn full() -> Self {
        Self {
            bounding: caps::all(),
            effective: caps::all(),
            permitted: caps::all(),
            inheritable: CapsHashSet::new(),
            log: Vec::new(),
        }
    }
}

impl CapabilityStore for FakeCaps {
    fn read(&self, set: CapSet) -> Result<CapsHashSet, CapsError> {
        Ok(match set {
            CapSet::Bounding => self.bounding.clone(),
            CapSet::Effective => self.effective.clone(),
            CapSet::Permitted => self.permitted.clone(),
            CapSet::Inheritable => self.inheritable.clone(),
            CapSet::Ambient => CapsHashSet::new(),
        })
    }

    fn drop_bounding(&mut self, cap: Capability) -> Result<(), CapsError> {
        self.log.push(format!("drop {cap}"));
        if !self.effective.contains(&Capability::CAP_SETPCAP) {
            return Err(CapsError::from("EPERM: CAP_SETPCAP not effective"));
        }
        self.bounding.remove(&cap);
        Ok(())
    }

    fn set(&mut self, set: CapSet, value: &CapsHashSet) -> Result<(), CapsError> {
        self.log.push(format!("set {set:?}"));
        match set {
            CapSet::Inheritable => self.inheritable = value.clone(),
            CapSet::Effective => {
                if !value.is_subset(&self.permitted) {
                    return Err(CapsError::from("EPERM: effective exceeds permitted"));
                }
                self.effective = value.clone();
            }
            CapSet::Permitted => {
                if !value.is_subset(&self.permitted) || !self.effective.is_subset(value) {
                    return Err(CapsError::from("EPERM: permitted cannot grow"));
                }
                self.permitted = value.clone();
            }
            CapSet::Bounding | CapSet::Ambient => {
                return Err(CapsError::from("unsupported set"));
            }
        }
        Ok(())
    }
}
