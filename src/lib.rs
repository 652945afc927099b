//! rootsense: a heuristic device-integrity probe engine
//! Inspects the running environment for root managers, injectors and hook
//! frameworks, and reports a single verdict or a bounded list of findings.
//!
//! # Architecture
//!
//! The crate is organized bottom-up, kernel tables first:
//!
//! ## Kernel Primitives ([`kernel`])
//! - [`kernel::procfs`]: Whole-buffer and line-oriented pseudo-file reads
//! - [`kernel::mount`]: Mount-set comparison between self and init
//! - [`kernel::process`]: Process-tree scan of command lines and maps
//! - [`kernel::isolation`]: Forked probe execution with a one-bit result
//!
//! ## Evidence ([`verdict`])
//! - [`verdict::evidence`]: Category vocabulary and the bounded evidence store
//! - [`verdict::report`]: Flat `category|detail` records and the pass report
//!
//! ## Probes ([`probe`])
//! - [`probe::context`]: The environment a probe may observe
//! - [`probe::sources`]: Injectable property and log text sources
//! - [`probe::registry`]: Ordered verdict and finding registries
//!
//! ## Aggregation ([`core`])
//! - [`core::engine`]: `any_positive` / `collect_evidence` and the host entry points
//!
//! ## Configuration ([`config`])
//! - [`config::types`]: Error taxonomy and shared constants
//! - [`config::loader`]: JSON engine configuration
//! - [`config::signatures`]: Heuristic path and substring registry
//! - [`config::validator`]: Startup validation
//!
//! # Design Principles
//!
//! 1. **Availability over diagnosability** - a failing probe found nothing
//! 2. **Kernel as truth** - evidence comes from `/proc` and the filesystem
//! 3. **One bit across the fork** - isolated probes never write evidence
//! 4. **Bounded everything** - store capacity, record length, child deadline

// Kernel Primitives
pub mod kernel;

// Evidence
pub mod verdict;

// Probes
pub mod probe;

// Aggregation
pub mod core;

// Configuration
pub mod config;

// CLI entrypoint wiring for the rootsense binary.
pub mod cli;

pub use crate::config::loader::EngineConfig;
pub use crate::config::types::{ProbeError, Result};
pub use crate::core::engine::{enumerate_compromise_evidence, is_environment_compromised, Engine};
pub use crate::verdict::{Category, Evidence, EvidenceReport, EvidenceStore};
