/// The aggregator: runs every registered probe and merges the results
///
/// Contract A (`any_positive`) ORs the verdict probes, forking the ones that
/// ask for isolation. Contract B (`collect_evidence`) feeds the finding
/// probes into one bounded store. Both run probes strictly one after the
/// other in registry order, and neither lets a probe failure escape.
use crate::config::loader::EngineConfig;
use crate::kernel::isolation::IsolatedRunner;
use crate::probe::{Environment, FindingRegistry, Isolation, Probe, ProbeRegistry};
use crate::verdict::evidence::EvidenceStore;
use crate::verdict::report::EvidenceReport;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use uuid::Uuid;

/// Result of one verdict probe within a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeVerdict {
    pub id: String,
    pub positive: bool,
}

pub struct Engine {
    config: EngineConfig,
    env: Environment,
    verdict_probes: ProbeRegistry,
    finding_probes: FindingRegistry,
    runner: IsolatedRunner,
}

impl Engine {
    /// Standard registries against the host sources described by `config`
    pub fn new(config: EngineConfig) -> Self {
        let env = Environment::from_config(&config);
        Self::with_environment(config, env)
    }

    /// Live device with compiled-in defaults
    pub fn host() -> Self {
        Self::new(EngineConfig::default())
    }

    pub fn with_environment(config: EngineConfig, env: Environment) -> Self {
        let runner = IsolatedRunner::new(config.isolation_timeout());
        Self {
            config,
            env,
            verdict_probes: ProbeRegistry::standard(),
            finding_probes: FindingRegistry::standard(),
            runner,
        }
    }

    pub fn with_runner(mut self, runner: IsolatedRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_registries(mut self, verdict_probes: ProbeRegistry, finding_probes: FindingRegistry) -> Self {
        self.verdict_probes = verdict_probes;
        self.finding_probes = finding_probes;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Run one verdict probe; a panic or isolation failure is a negative
    fn run_probe(&self, probe: &dyn Probe) -> bool {
        match probe.isolation() {
            Isolation::Forked => self.runner.run_isolated(|| probe.detect(&self.env)),
            Isolation::InProcess => {
                match panic::catch_unwind(AssertUnwindSafe(|| probe.detect(&self.env))) {
                    Ok(positive) => positive,
                    Err(_) => {
                        log::warn!("probe {} panicked; counted as negative", probe.id());
                        false
                    }
                }
            }
        }
    }

    /// Every verdict probe, in registry order. No short-circuit.
    pub fn verdicts(&self) -> Vec<ProbeVerdict> {
        let pass_id = Uuid::new_v4();
        log::debug!("[{}] verdict pass over {} probes", pass_id, self.verdict_probes.len());

        let verdicts: Vec<ProbeVerdict> = self
            .verdict_probes
            .iter()
            .map(|probe| {
                let positive = self.run_probe(probe);
                log::debug!("[{}] {} -> {}", pass_id, probe.id(), positive);
                ProbeVerdict {
                    id: probe.id().to_string(),
                    positive,
                }
            })
            .collect();

        let positives = verdicts.iter().filter(|v| v.positive).count();
        log::info!(
            "[{}] verdict pass done: {}/{} probes positive",
            pass_id,
            positives,
            verdicts.len()
        );
        verdicts
    }

    /// Contract A: logical OR over every verdict probe
    pub fn any_positive(&self) -> bool {
        self.verdicts().iter().any(|v| v.positive)
    }

    /// Contract B: findings from every probe until the store fills up
    pub fn collect_evidence(&self) -> EvidenceReport {
        let pass_id = Uuid::new_v4().to_string();
        let mut store = EvidenceStore::new(self.config.evidence_capacity, self.config.record_max_len);

        for probe in self.finding_probes.iter() {
            if store.is_full() {
                log::debug!("[{}] evidence store full, skipping {}", pass_id, probe.id());
                break;
            }
            let before = store.len();
            let collected = panic::catch_unwind(AssertUnwindSafe(|| probe.collect(&self.env, &mut store)));
            if collected.is_err() {
                log::warn!("[{}] probe {} panicked; keeping what it recorded", pass_id, probe.id());
            }
            log::debug!("[{}] {} -> {} finding(s)", pass_id, probe.id(), store.len() - before);
        }

        let saturated = store.is_full();
        if store.dropped() > 0 {
            log::warn!("[{}] {} finding(s) dropped at capacity {}", pass_id, store.dropped(), store.capacity());
        }
        log::info!("[{}] evidence pass done: {} finding(s)", pass_id, store.len());

        EvidenceReport::new(
            pass_id,
            store.capacity(),
            saturated,
            store.into_entries(),
            self.config.record_max_len,
        )
    }

    pub fn is_environment_compromised(&self) -> bool {
        self.any_positive()
    }

    /// Flat `category|detail` records
    pub fn enumerate_compromise_evidence(&self) -> Vec<String> {
        self.collect_evidence().records
    }
}

/// Single-bit verdict for the live device
pub fn is_environment_compromised() -> bool {
    Engine::host().is_environment_compromised()
}

/// `category|detail` records for the live device
pub fn enumerate_compromise_evidence() -> Vec<String> {
    Engine::host().enumerate_compromise_evidence()
}
