//! Environment probes
//!
//! A probe is a stateless, idempotent check against one [`Environment`].
//! Verdict probes ([`Probe`]) feed the boolean aggregate and may ask to be
//! run in a forked child. Finding probes ([`FindingProbe`]) write structured
//! evidence and always run in-process, so an isolated probe can never
//! contribute more than one bit.

pub mod context;
pub mod isolated;
pub mod memory;
pub mod mounts;
pub mod paths;
pub mod registry;
pub mod sources;
pub mod system;

pub use context::Environment;
pub use registry::{FindingRegistry, ProbeRegistry};

use crate::verdict::evidence::EvidenceStore;

/// Where a verdict probe runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    InProcess,
    /// Forked child; for probes with observable side effects or crash risk
    Forked,
}

/// Boolean probe for the single-verdict API
pub trait Probe {
    fn id(&self) -> &str;

    fn isolation(&self) -> Isolation {
        Isolation::InProcess
    }

    fn detect(&self, env: &Environment) -> bool;
}

/// Structured probe for the evidence API
pub trait FindingProbe {
    fn id(&self) -> &str;

    fn collect(&self, env: &Environment, store: &mut EvidenceStore);
}

/// Closure-backed verdict probe
pub struct FnProbe<F> {
    id: String,
    isolation: Isolation,
    detect: F,
}

impl<F> FnProbe<F>
where
    F: Fn(&Environment) -> bool,
{
    pub fn new(id: &str, detect: F) -> Self {
        Self {
            id: id.to_string(),
            isolation: Isolation::InProcess,
            detect,
        }
    }

    pub fn isolated(id: &str, detect: F) -> Self {
        Self {
            id: id.to_string(),
            isolation: Isolation::Forked,
            detect,
        }
    }
}

impl<F> Probe for FnProbe<F>
where
    F: Fn(&Environment) -> bool,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn isolation(&self) -> Isolation {
        self.isolation
    }

    fn detect(&self, env: &Environment) -> bool {
        (self.detect)(env)
    }
}

/// Closure-backed finding probe
pub struct FnFindingProbe<F> {
    id: String,
    collect: F,
}

impl<F> FnFindingProbe<F>
where
    F: Fn(&Environment, &mut EvidenceStore),
{
    pub fn new(id: &str, collect: F) -> Self {
        Self {
            id: id.to_string(),
            collect,
        }
    }
}

impl<F> FindingProbe for FnFindingProbe<F>
where
    F: Fn(&Environment, &mut EvidenceStore),
{
    fn id(&self) -> &str {
        &self.id
    }

    fn collect(&self, env: &Environment, store: &mut EvidenceStore) {
        (self.collect)(env, store)
    }
}
