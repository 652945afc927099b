/// Engine configuration loading from a JSON file
use crate::config::signatures::SignatureSet;
use crate::config::types::{
    ProbeError, Result, DEFAULT_EVIDENCE_CAPACITY, DEFAULT_ISOLATION_TIMEOUT_MS,
    DEFAULT_READ_CAPACITY, DEFAULT_RECORD_MAX_LEN,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Full engine configuration. Every field has a default, so `{}` is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Evidence store capacity for one aggregation pass
    pub evidence_capacity: usize,
    /// Character cap for evidence details and flat records
    pub record_max_len: usize,
    /// Fallback allocation for pseudo-files reporting size zero
    pub read_capacity: usize,
    /// Deadline for isolated probe children; `None` waits forever
    pub isolation_timeout_ms: Option<u64>,
    /// Root under which signature paths are resolved
    pub fs_root: PathBuf,
    /// Procfs mount used for every kernel table
    pub proc_root: PathBuf,
    pub signatures: SignatureSet,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            evidence_capacity: DEFAULT_EVIDENCE_CAPACITY,
            record_max_len: DEFAULT_RECORD_MAX_LEN,
            read_capacity: DEFAULT_READ_CAPACITY,
            isolation_timeout_ms: Some(DEFAULT_ISOLATION_TIMEOUT_MS),
            fs_root: PathBuf::from("/"),
            proc_root: PathBuf::from("/proc"),
            signatures: SignatureSet::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| ProbeError::Config(format!("Failed to parse config JSON: {}", e)))
    }

    pub fn isolation_timeout(&self) -> Option<Duration> {
        self.isolation_timeout_ms.map(Duration::from_millis)
    }
}
