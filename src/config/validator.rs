// Config validation
// Fail fast with actionable errors before the first aggregation pass

use crate::config::loader::EngineConfig;
use crate::config::types::{ProbeError, Result};
use crate::verdict::evidence::Category;

/// Validation result with detailed errors
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate config at startup. Errors are fatal, warnings are logged.
pub fn validate_config(config: &EngineConfig) -> Result<ValidationResult> {
    let mut result = ValidationResult::new();

    validate_limits(config, &mut result);
    validate_roots(config, &mut result);
    validate_signatures(config, &mut result);

    for warning in &result.warnings {
        log::warn!("config: {}", warning);
    }

    if !result.is_valid() {
        return Err(ProbeError::Config(format!(
            "Config validation failed:\n{}",
            result.errors.join("\n")
        )));
    }

    Ok(result)
}

fn validate_limits(config: &EngineConfig, result: &mut ValidationResult) {
    if config.evidence_capacity == 0 {
        result.add_error("evidence_capacity must be greater than zero".to_string());
    }

    let longest_category = Category::ALL
        .iter()
        .map(|c| c.as_str().len())
        .max()
        .unwrap_or(0);
    // category, separator and at least one detail character
    if config.record_max_len < longest_category + 2 {
        result.add_error(format!(
            "record_max_len {} cannot hold the longest category ({} chars) plus a detail",
            config.record_max_len, longest_category
        ));
    }

    if config.read_capacity == 0 {
        result.add_error("read_capacity must be greater than zero".to_string());
    }

    match config.isolation_timeout_ms {
        None => result.add_warning(
            "isolation_timeout_ms is null: a hung isolated probe will hang the pass".to_string(),
        ),
        Some(0) => result.add_error("isolation_timeout_ms must be greater than zero".to_string()),
        Some(_) => {}
    }
}

fn validate_roots(config: &EngineConfig, result: &mut ValidationResult) {
    if !config.fs_root.is_dir() {
        result.add_error(format!(
            "fs_root {} is not a directory",
            config.fs_root.display()
        ));
    }

    // An absent procfs is tolerated; every procfs probe degrades to "no evidence".
    if !config.proc_root.is_dir() {
        result.add_warning(format!(
            "proc_root {} is not a directory; procfs probes will find nothing",
            config.proc_root.display()
        ));
    }
}

fn validate_signatures(config: &EngineConfig, result: &mut ValidationResult) {
    let sigs = &config.signatures;
    if sigs.magisk_paths.is_empty() && sigs.su_paths.is_empty() {
        result.add_warning("no su or magisk paths configured".to_string());
    }
    for path in sigs.su_paths.iter().chain(sigs.magisk_paths.iter()) {
        if !path.starts_with('/') {
            result.add_error(format!("signature path must be absolute: {}", path));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let result = validate_config(&EngineConfig::default()).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = EngineConfig {
            evidence_capacity: 0,
            ..EngineConfig::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("evidence_capacity"));
    }

    #[test]
    fn test_tiny_record_len_rejected() {
        let config = EngineConfig {
            record_max_len: 8,
            ..EngineConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_unbounded_timeout_is_warning() {
        let config = EngineConfig {
            isolation_timeout_ms: None,
            ..EngineConfig::default()
        };
        let result = validate_config(&config).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_relative_signature_path_rejected() {
        let mut config = EngineConfig::default();
        config.signatures.su_paths.push("system/bin/su".to_string());
        assert!(validate_config(&config).is_err());
    }
}
