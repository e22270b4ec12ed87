//! Virtual filesystems mounted inside the sandbox root

use super::sys::Syscalls;
use crate::{NsrootError, Result, SandboxRoot};
use nix::mount::MsFlags;
use serde::{Serialize, Serializer};
use std::path::PathBuf;

/// A filesystem mounted at a fixed path below the sandbox root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MountSpec {
    /// Source label passed to mount(2)
    pub source: &'static str,
    /// Absolute path inside the sandbox
    pub target: &'static str,
    pub fstype: &'static str,
    /// Comma-joined filesystem options
    pub options: Option<&'static str>,
    #[serde(serialize_with = "serialize_flags")]
    pub flags: MsFlags,
}

const NOSUID_NOEXEC: MsFlags = MsFlags::MS_NOSUID.union(MsFlags::MS_NOEXEC);
const NOSUID_NOEXEC_NODEV: MsFlags = NOSUID_NOEXEC.union(MsFlags::MS_NODEV);

/// Mounted in this order; `/proc` has to be up before anything in the
/// sandbox reads process information.
pub const MOUNTS: &[MountSpec] = &[
    MountSpec {
        source: "devpts",
        target: "/dev/pts",
        fstype: "devpts",
        options: Some("newinstance,ptmxmode=0666,mode=0600,gid=5"),
        flags: NOSUID_NOEXEC,
    },
    MountSpec {
        source: "shm",
        target: "/dev/shm",
        fstype: "tmpfs",
        options: Some("size=256M,nr_inodes=16k,mode=1777"),
        flags: NOSUID_NOEXEC_NODEV,
    },
    MountSpec {
        source: "proc",
        target: "/proc",
        fstype: "proc",
        options: None,
        flags: NOSUID_NOEXEC_NODEV,
    },
    MountSpec {
        source: "runfs",
        target: "/run",
        fstype: "tmpfs",
        options: Some("size=8M,nr_inodes=8k,mode=1775,gid=500"),
        flags: NOSUID_NOEXEC,
    },
    MountSpec {
        source: "tmpfs",
        target: "/tmp",
        fstype: "tmpfs",
        options: Some("size=256M,nr_inodes=16k,mode=1777"),
        flags: MsFlags::MS_NOSUID,
    },
    MountSpec {
        source: "tmpfs",
        target: "/var/tmp/portage",
        fstype: "tmpfs",
        options: Some("size=2G,nr_inodes=256k,mode=0755,uid=250,gid=250"),
        flags: MsFlags::MS_NOSUID,
    },
];

/// Longest path mount(2) accepts, terminating NUL included
const PATH_MAX: usize = libc::PATH_MAX as usize;

impl MountSpec {
    /// Absolute host path of this mount under `root`
    ///
    /// Paths that would not fit in `PATH_MAX` are rejected rather than cut.
    pub fn host_target(&self, root: &SandboxRoot) -> Result<PathBuf> {
        let target = root.resolve(self.target);
        if target.as_os_str().len() + 1 > PATH_MAX {
            return Err(NsrootError::TargetTooLong {
                target,
                limit: PATH_MAX,
            });
        }
        Ok(target)
    }
}

/// Mount every entry of [`MOUNTS`] under `root`, stopping at the first failure.
///
/// Mounts made before a failure stay in place; the child exits right after
/// and takes its mount namespace with it.
pub fn provision<S: Syscalls>(root: &SandboxRoot, sys: &mut S) -> Result<()> {
    for spec in MOUNTS {
        let target = spec.host_target(root)?;
        tracing::debug!(source = spec.source, fstype = spec.fstype, ?target, "mount");

        sys.mount(spec, &target)
            .map_err(|source| NsrootError::Mount { target, source })?;
    }
    Ok(())
}

fn serialize_flags<S: Serializer>(
    flags: &MsFlags,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let names: Vec<&str> = [
        (MsFlags::MS_NOSUID, "nosuid"),
        (MsFlags::MS_NOEXEC, "noexec"),
        (MsFlags::MS_NODEV, "nodev"),
    ]
    .into_iter()
    .filter(|(flag, _)| flags.contains(*flag))
    .map(|(_, name)| name)
    .collect();
    names.serialize(serializer)
}
