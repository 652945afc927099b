/// Flat `category|detail` records handed to the host
use crate::verdict::evidence::{truncate_chars, Evidence};
use serde::Serialize;

/// Render one evidence entry as `category|detail`, capped at `max_len` characters
pub fn format_record(evidence: &Evidence, max_len: usize) -> String {
    let record = format!("{}|{}", evidence.category().as_str(), evidence.detail());
    truncate_chars(&record, max_len).to_string()
}

pub fn format_records(evidence: &[Evidence], max_len: usize) -> Vec<String> {
    evidence.iter().map(|e| format_record(e, max_len)).collect()
}

/// Outcome of one findings pass
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceReport {
    pub pass_id: String,
    pub capacity: usize,
    /// True when the store filled up and later findings were dropped
    pub saturated: bool,
    pub evidence: Vec<Evidence>,
    pub records: Vec<String>,
}

impl EvidenceReport {
    pub fn new(
        pass_id: String,
        capacity: usize,
        saturated: bool,
        evidence: Vec<Evidence>,
        record_max_len: usize,
    ) -> Self {
        let records = format_records(&evidence, record_max_len);
        Self {
            pass_id,
            capacity,
            saturated,
            evidence,
            records,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.evidence.is_empty()
    }
}
