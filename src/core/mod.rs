//! Probe aggregation core.
//!
//! Owns the aggregation pass: registry order, isolation dispatch, evidence
//! bounding and the two host-facing entry points.

pub mod engine;

pub use engine::{enumerate_compromise_evidence, is_environment_compromised, Engine, ProbeVerdict};
