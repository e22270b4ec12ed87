//! Error types for nsroot-core

use nix::errno::Errno;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NsrootError {
    #[error("unshare(2): {0}")]
    Namespace(Errno),

    #[error("mount(2) making / private: {0}")]
    Propagation(Errno),

    #[error("fork(2): {0}")]
    Fork(Errno),

    #[error("waitpid(2): {0}")]
    Wait(Errno),

    #[error("waitpid(2): unexpected status {0}")]
    UnexpectedStatus(String),

    #[error("mount(2) {target}: {source}")]
    Mount {
        target: PathBuf,
        #[source]
        source: Errno,
    },

    #[error("mount target exceeds {limit} bytes: {target}")]
    TargetTooLong { target: PathBuf, limit: usize },

    #[error("chroot(2): {0}")]
    Chroot(Errno),

    #[error("chdir(2): {0}")]
    Chdir(Errno),

    #[error("capabilities: {0}")]
    Capabilities(#[from] caps::errors::CapsError),

    #[error("execv(3) {path}: {source}")]
    Exec {
        path: PathBuf,
        #[source]
        source: Errno,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl NsrootError {
    /// Short name of the step that failed, used as a structured log field
    #[must_use]
    pub const fn step(&self) -> &'static str {
        match self {
            Self::Namespace(_) | Self::Propagation(_) => "namespace",
            Self::Fork(_) => "fork",
            Self::Wait(_) | Self::UnexpectedStatus(_) => "wait",
            Self::Mount { .. } | Self::TargetTooLong { .. } => "provision",
            Self::Chroot(_) | Self::Chdir(_) => "root",
            Self::Capabilities(_) => "capabilities",
            Self::Exec { .. } => "exec",
            Self::Io(_) | Self::Config(_) => "config",
        }
    }
}
