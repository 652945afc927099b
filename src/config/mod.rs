//! Configuration and signatures
//!
//! Error taxonomy, engine configuration, the heuristic signature registry
//! and startup validation.

pub mod loader;
pub mod signatures;
pub mod types;
pub mod validator;
