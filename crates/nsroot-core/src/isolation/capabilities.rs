//! Capability reduction
//!
//! Every set is cleared and the allow-list below is installed in the
//! bounding, effective and permitted sets. Inheritable ends empty, which
//! also empties the ambient set. The list keeps ptrace, id switching and
//! resource control because the target is expected to run its own
//! privilege management inside the sandbox.

use crate::Result;
use caps::errors::CapsError;
use caps::{CapSet, Capability, CapsHashSet};

/// Capabilities the sandboxed process keeps
pub const ALLOWED: &[Capability] = &[
    // Networking
    Capability::CAP_NET_BIND_SERVICE,
    // Filesystem
    Capability::CAP_CHOWN,
    Capability::CAP_DAC_OVERRIDE,
    Capability::CAP_DAC_READ_SEARCH,
    Capability::CAP_FOWNER,
    Capability::CAP_FSETID,
    // Processes
    Capability::CAP_KILL,
    Capability::CAP_SETGID,
    Capability::CAP_SETUID,
    Capability::CAP_SETPCAP,
    Capability::CAP_IPC_LOCK,
    Capability::CAP_IPC_OWNER,
    Capability::CAP_LEASE,
    Capability::CAP_SYS_PTRACE,
    Capability::CAP_SYS_NICE,
    Capability::CAP_SYS_RESOURCE,
];

/// Read and write access to the calling process's capability sets
pub trait CapabilityStore {
    fn read(&self, set: CapSet) -> std::result::Result<CapsHashSet, CapsError>;
    fn drop_bounding(&mut self, cap: Capability) -> std::result::Result<(), CapsError>;
    fn set(&mut self, set: CapSet, value: &CapsHashSet) -> std::result::Result<(), CapsError>;
}

/// Changes needed to go from the current state to the allow-list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityPlan {
    /// Bounding set entries outside the allow-list
    pub bounding_drops: Vec<Capability>,
    /// Final effective and permitted sets
    pub allowed: CapsHashSet,
}

impl CapabilityPlan {
    #[must_use]
    pub fn new(current_bounding: &CapsHashSet) -> Self {
        let allowed = allowed_set();
        let mut bounding_drops: Vec<Capability> = current_bounding
            .iter()
            .filter(|cap| !allowed.contains(cap))
            .copied()
            .collect();
        bounding_drops.sort_by_key(|cap| cap.index());

        Self {
            bounding_drops,
            allowed,
        }
    }

    /// Apply the plan.
    ///
    /// Effective is set first: it brings CAP_SETPCAP up for the bounding
    /// drops, and it must never exceed the permitted set narrowed last.
    pub fn commit<C: CapabilityStore>(&self, store: &mut C) -> Result<()> {
        store.set(CapSet::Effective, &self.allowed)?;
        for cap in &self.bounding_drops {
            store.drop_bounding(*cap)?;
        }
        store.set(CapSet::Inheritable, &CapsHashSet::new())?;
        store.set(CapSet::Permitted, &self.allowed)?;
        Ok(())
    }
}

#[must_use]
pub fn allowed_set() -> CapsHashSet {
    ALLOWED.iter().copied().collect()
}

/// Reduce the calling process to the allow-list
pub fn reduce<C: CapabilityStore>(store: &mut C) -> Result<()> {
    let bounding = store.read(CapSet::Bounding)?;
    let plan = CapabilityPlan::new(&bounding);
    tracing::debug!(
        dropped = plan.bounding_drops.len(),
        kept = plan.allowed.len(),
        "reducing capabilities"
    );
    plan.commit(store)
}
