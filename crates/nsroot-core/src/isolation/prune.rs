//! Unmounting everything that lives outside the sandbox root
//!
//! The mount table is read to the end and closed before the first unmount:
//! the table itself is served by a filesystem (usually `/proc`) that is
//! one of the candidates for removal.

use super::sys::Syscalls;
use crate::{Result, SandboxRoot};
use std::collections::VecDeque;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// Mountpoints to remove, most recently discovered first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneList(VecDeque<PathBuf>);

impl PruneList {
    /// Scan a mount table, keeping every mountpoint outside `root`.
    ///
    /// Each kept entry goes to the front, so the list ends up in reverse
    /// table order and nested mounts come before their parents. A read error
    /// ends the scan with whatever was collected so far.
    pub fn scan<R: BufRead>(reader: R, root: &SandboxRoot) -> Self {
        let mut list = VecDeque::new();

        for line in reader.split(b'\n') {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::debug!(error = %e, "mount table read stopped early");
                    break;
                }
            };

            let Some(mountpoint) = parse_mountpoint(&line) else {
                continue;
            };
            if root.contains(&mountpoint) {
                continue;
            }
            list.push_front(mountpoint);
        }

        Self(list)
    }

    /// Read and scan the mount table at `path`
    pub fn read(path: &Path, root: &SandboxRoot) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::scan(BufReader::new(file), root))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.0.iter().map(PathBuf::as_path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Try to unmount every entry in order, returning how many succeeded.
    ///
    /// Failures are expected (EBUSY on parents of mounts we keep, EINVAL for
    /// mounts that already went away with a parent) and are not retried.
    pub fn unmount_all<S: Syscalls>(self, sys: &mut S) -> usize {
        let mut unmounted = 0;
        for mountpoint in self.0 {
            match sys.umount(&mountpoint) {
                Ok(()) => unmounted += 1,
                Err(errno) => tracing::trace!(?mountpoint, %errno, "unmount skipped"),
            }
        }
        unmounted
    }
}

impl From<PruneList> for Vec<PathBuf> {
    fn from(list: PruneList) -> Self {
        list.0.into()
    }
}

/// Best-effort removal of every mount outside `root`.
///
/// An unreadable mount table means there is nothing to prune.
pub fn prune_outside<S: Syscalls>(root: &SandboxRoot, table: &Path, sys: &mut S) {
    let list = match PruneList::read(table, root) {
        Ok(list) => list,
        Err(e) => {
            tracing::debug!(table = ?table, error = %e, "mount table unavailable, skipping prune");
            return;
        }
    };

    let candidates = list.len();
    let unmounted = list.unmount_all(sys);
    tracing::debug!(candidates, unmounted, "pruned mounts outside root");
}

/// Extract the mountpoint (second field) of a mount table line
fn parse_mountpoint(line: &[u8]) -> Option<PathBuf> {
    let field = line
        .split(u8::is_ascii_whitespace)
        .filter(|field| !field.is_empty())
        .nth(1)?;
    Some(PathBuf::from(OsStr::from_bytes(&unescape(field))))
}

/// Decode the `\ooo` octal escapes the kernel uses for whitespace and `\`
fn unescape(field: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(field.len());
    let mut i = 0;

    while i < field.len() {
        if field[i] == b'\\' {
            if let Some(byte) = field.get(i + 1..i + 4).and_then(octal_byte) {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(field[i]);
        i += 1;
    }

    out
}

fn octal_byte(digits: &[u8]) -> Option<u8> {
    let mut value: u16 = 0;
    for &d in digits {
        if !(b'0'..=b'7').contains(&d) {
            return None;
        }
        value = value * 8 + u16::from(d - b'0');
    }
    u8::try_from(value).ok()
}
