//! Thin wrappers around Linux kernel interfaces.
//!
//! All `unsafe` code is concentrated here.
//! Dependency direction: procfs -> mount, process. isolation stands alone.

pub mod isolation;
pub mod mount;
pub mod process;
pub mod procfs;
