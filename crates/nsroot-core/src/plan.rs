//! What a run would do, without touching the kernel

use crate::isolation::capabilities::ALLOWED;
use crate::isolation::{namespace, MountSpec, PruneList, MOUNTS};
use crate::{Result, SandboxConfig, SandboxRoot};
use serde::Serialize;
use std::path::PathBuf;

/// A mount from the fixed table with its resolved host path
#[derive(Debug, Clone, Serialize)]
pub struct PlannedMount {
    #[serde(flatten)]
    pub spec: MountSpec,
    pub host_target: PathBuf,
}

/// Everything the supervisor and child would do for a config
#[derive(Debug, Clone, Serialize)]
pub struct SandboxPlan {
    pub root: SandboxRoot,
    pub target: PathBuf,
    pub namespaces: Vec<&'static str>,
    pub mount_table: PathBuf,
    /// Unmount attempts, in order
    pub prune: Vec<PathBuf>,
    pub mounts: Vec<PlannedMount>,
    pub capabilities: Vec<String>,
}

impl SandboxPlan {
    /// Build the plan; fails if the mount table cannot be read or a mount
    /// target does not fit
    pub fn build(config: &SandboxConfig) -> Result<Self> {
        let prune = PruneList::read(&config.mount_table, &config.root)?;

        let mounts = MOUNTS
            .iter()
            .map(|spec| {
                Ok(PlannedMount {
                    spec: *spec,
                    host_target: spec.host_target(&config.root)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            root: config.root.clone(),
            target: config.target.clone(),
            namespaces: namespace::names(),
            mount_table: config.mount_table.clone(),
            prune: prune.into(),
            mounts,
            capabilities: ALLOWED.iter().map(ToString::to_string).collect(),
        })
    }
}
