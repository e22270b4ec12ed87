//! Linux namespace isolation

use crate::{NsrootError, Result};
use nix::mount::MsFlags;
use nix::sched::CloneFlags;

/// IPC, PID, UTS and mount. User and network stay shared with the host.
pub const SANDBOX_NAMESPACES: CloneFlags = CloneFlags::CLONE_NEWIPC
    .union(CloneFlags::CLONE_NEWPID)
    .union(CloneFlags::CLONE_NEWUTS)
    .union(CloneFlags::CLONE_NEWNS);

/// Short names of the unshared namespaces, as listed in the plan
#[must_use]
pub fn names() -> Vec<&'static str> {
    [
        (CloneFlags::CLONE_NEWIPC, "ipc"),
        (CloneFlags::CLONE_NEWPID, "pid"),
        (CloneFlags::CLONE_NEWUTS, "uts"),
        (CloneFlags::CLONE_NEWNS, "mount"),
        (CloneFlags::CLONE_NEWNET, "net"),
        (CloneFlags::CLONE_NEWUSER, "user"),
    ]
    .into_iter()
    .filter(|(flag, _)| SANDBOX_NAMESPACES.contains(*flag))
    .map(|(_, name)| name)
    .collect()
}

/// Enter new namespaces using unshare
///
/// The calling process keeps its PID; the next child it forks is PID 1
/// of the new PID namespace. The whole mount tree is then made private so
/// nothing done in the sandbox propagates back to the host.
pub fn enter() -> Result<()> {
    tracing::debug!(flags = ?SANDBOX_NAMESPACES, "unsharing namespaces");
    nix::sched::unshare(SANDBOX_NAMESPACES).map_err(NsrootError::Namespace)?;
    make_mounts_private()
}

fn make_mounts_private() -> Result<()> {
    nix::mount::mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_REC | MsFlags::MS_PRIVATE,
        None::<&str>,
    )
    .map_err(NsrootError::Propagation)
}
