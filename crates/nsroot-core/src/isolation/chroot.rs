//! Switching the filesystem root

use super::sys::Syscalls;
use crate::{NsrootError, Result, SandboxRoot};
use std::path::Path;

/// chroot into `root`, then chdir to its top.
///
/// The order matters: a chdir issued before the chroot resolves `/` against
/// the old root and leaves the working directory outside the sandbox.
pub fn enter_root<S: Syscalls>(root: &SandboxRoot, sys: &mut S) -> Result<()> {
    tracing::debug!(root = ?root.as_path(), "chroot");
    sys.chroot(root.as_path()).map_err(NsrootError::Chroot)?;
    sys.chdir(Path::new("/")).map_err(NsrootError::Chdir)?;
    Ok(())
}
