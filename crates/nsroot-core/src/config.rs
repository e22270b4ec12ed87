//! Sandbox configuration

use crate::{NsrootError, Result};
use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// Mount table read by the pruner unless overridden
pub const DEFAULT_MOUNT_TABLE: &str = "/proc/self/mounts";

/// Absolute path of the sandbox root, without trailing separators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SandboxRoot(PathBuf);

impl SandboxRoot {
    /// Normalize `raw` into an owned root path.
    ///
    /// Trailing `/` are stripped. A path that is empty after stripping
    /// (including `/` itself) or that is relative is rejected.
    pub fn new(raw: impl AsRef<OsStr>) -> Result<Self> {
        let raw = raw.as_ref();
        let mut bytes = raw.as_bytes();
        while let [rest @ .., b'/'] = bytes {
            bytes = rest;
        }

        if bytes.is_empty() {
            return Err(NsrootError::Config(format!(
                "sandbox root {raw:?} resolves to the host root"
            )));
        }
        if bytes[0] != b'/' {
            return Err(NsrootError::Config(format!(
                "sandbox root {raw:?} is not an absolute path"
            )));
        }

        Ok(Self(PathBuf::from(OsStr::from_bytes(bytes))))
    }

    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_os_str().as_bytes()
    }

    /// Whether `mountpoint` starts with the root's bytes.
    ///
    /// This is a byte prefix test, not a path component test: with a root of
    /// `/srv/box`, both `/srv/box/proc` and `/srv/boxes` are inside.
    #[must_use]
    pub fn contains(&self, mountpoint: &Path) -> bool {
        mountpoint.as_os_str().as_bytes().starts_with(self.as_bytes())
    }

    /// Concatenate the root with an absolute in-sandbox path
    #[must_use]
    pub fn resolve(&self, inner: &str) -> PathBuf {
        let mut joined = OsString::from(self.0.as_os_str());
        joined.push(inner);
        PathBuf::from(joined)
    }
}

/// Configuration for a sandbox run
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// New filesystem root for the child
    pub root: SandboxRoot,

    /// Executable started inside the root
    pub target: PathBuf,

    /// Mount table scanned by the pruner
    pub mount_table: PathBuf,
}

impl SandboxConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> SandboxConfigBuilder {
        SandboxConfigBuilder::default()
    }
}

/// Builder for SandboxConfig
#[derive(Debug, Default)]
pub struct SandboxConfigBuilder {
    root: Option<OsString>,
    target: Option<PathBuf>,
    mount_table: Option<PathBuf>,
}

impl SandboxConfigBuilder {
    #[must_use]
    pub fn root(mut self, root: impl Into<OsString>) -> Self {
        self.root = Some(root.into());
        self
    }

    #[must_use]
    pub fn target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn mount_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.mount_table = Some(path.into());
        self
    }

    /// Validate and build the config
    pub fn build(self) -> Result<SandboxConfig> {
        let root = self
            .root
            .ok_or_else(|| NsrootError::Config("sandbox root is required".into()))?;
        let target = self
            .target
            .ok_or_else(|| NsrootError::Config("target executable is required".into()))?;
        if target.as_os_str().is_empty() {
            return Err(NsrootError::Config("target executable is empty".into()));
        }

        Ok(SandboxConfig {
            root: SandboxRoot::new(root)?,
            target,
            mount_table: self
                .mount_table
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MOUNT_TABLE)),
        })
    }
}
