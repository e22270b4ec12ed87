//! Fork, set up the child, and mirror its termination

use crate::isolation::capabilities::{self, CapabilityStore};
use crate::isolation::sys::{LinuxHost, Syscalls};
use crate::isolation::{chroot, mounts, namespace, prune};
use crate::{NsrootError, Result, SandboxConfig};
use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, SigSet, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult};
use std::ffi::CString;
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use thiserror::Error;

/// Which side of the fork hit a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Parent,
    Child,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parent => f.write_str("parent"),
            Self::Child => f.write_str("child"),
        }
    }
}

/// A fatal setup error, tagged with the process that reports it
#[derive(Error, Debug)]
#[error("nsroot[{role}]: {error}")]
pub struct Failure {
    pub role: Role,
    #[source]
    pub error: NsrootError,
}

impl Role {
    const fn fail(self, error: NsrootError) -> Failure {
        Failure { role: self, error }
    }
}

/// How the sandboxed child ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildTermination {
    Exited(i32),
    Signaled(Signal),
}

impl ChildTermination {
    /// Interpret a waitpid(2) status; anything but exit or death by signal is an error
    pub fn from_status(status: WaitStatus) -> Result<Self> {
        match status {
            WaitStatus::Exited(_, code) => Ok(Self::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Ok(Self::Signaled(signal)),
            other => Err(NsrootError::UnexpectedStatus(format!("{other:?}"))),
        }
    }

    /// End the current process the same way the child ended.
    ///
    /// A signal is re-raised with its default disposition and unblocked, so
    /// the shell sees the same death. If the process somehow survives it
    /// exits with status 1.
    pub fn reflect(self) -> ! {
        match self {
            Self::Exited(code) => std::process::exit(code),
            Self::Signaled(sig) => {
                tracing::debug!(signal = %sig, "re-raising child signal");
                // SAFETY: installing SIG_DFL does not run any handler code
                let _ = unsafe { signal::signal(sig, SigHandler::SigDfl) };
                let mut mask = SigSet::empty();
                mask.add(sig);
                let _ = mask.thread_unblock();
                let _ = signal::raise(sig);
                std::process::exit(1)
            }
        }
    }
}

/// Runs one sandboxed executable
#[derive(Debug)]
pub struct Supervisor {
    config: SandboxConfig,
}

impl Supervisor {
    #[must_use]
    pub const fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Unshare, fork and wait for the child.
    ///
    /// Returns in the parent with the child's termination. The child only
    /// comes back from this call when a setup step or the exec failed.
    /// Must be called while the process is single threaded.
    pub fn run(&self) -> std::result::Result<ChildTermination, Failure> {
        namespace::enter().map_err(|e| Role::Parent.fail(e))?;

        // SAFETY: the process is single threaded, the child only runs the
        // setup steps before exec or exit
        match unsafe { fork() } {
            Err(errno) => Err(Role::Parent.fail(NsrootError::Fork(errno))),
            Ok(ForkResult::Parent { child }) => {
                tracing::info!(pid = child.as_raw(), "sandbox child started");
                let status = waitpid(child, None)
                    .map_err(|errno| Role::Parent.fail(NsrootError::Wait(errno)))?;
                tracing::debug!(?status, "sandbox child finished");
                ChildTermination::from_status(status).map_err(|e| Role::Parent.fail(e))
            }
            Ok(ForkResult::Child) => Err(Role::Child.fail(self.child_main())),
        }
    }

    /// Only returns on failure
    fn child_main(&self) -> NsrootError {
        if let Err(e) = prepare_child(&self.config, &mut LinuxHost) {
            tracing::debug!(step = e.step(), "child setup failed");
            return e;
        }
        exec_target(&self.config.target)
    }
}

/// Prune, provision, chroot and drop capabilities, in that order
pub fn prepare_child<H>(config: &SandboxConfig, host: &mut H) -> Result<()>
where
    H: Syscalls + CapabilityStore,
{
    prune::prune_outside(&config.root, &config.mount_table, host);
    mounts::provision(&config.root, host)?;
    chroot::enter_root(&config.root, host)?;
    capabilities::reduce(host)?;
    Ok(())
}

/// Replace the process image with `target`, passing only its own path as argv.
///
/// Returns the error if the exec did not happen.
pub fn exec_target(target: &Path) -> NsrootError {
    let Ok(path) = CString::new(target.as_os_str().as_bytes()) else {
        return NsrootError::Exec {
            path: target.to_path_buf(),
            source: Errno::EINVAL,
        };
    };

    tracing::info!(?target, "exec");
    match nix::unistd::execv(&path, &[&path]) {
        Ok(never) => match never {},
        Err(source) => NsrootError::Exec {
            path: target.to_path_buf(),
            source,
        },
    }
}
