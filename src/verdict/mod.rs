//! Evidence & verdict
//!
//! The bounded evidence store filled during one aggregation pass and the
//! flat records returned to the host.

pub mod evidence;
pub mod report;

pub use evidence::{Category, Evidence, EvidenceStore, Finding};
pub use report::EvidenceReport;
