/// Process-tree scanner
///
/// Finds processes whose command line matches a target substring and scans
/// their memory maps for injected-library signatures. Enumeration races with
/// process exit: a process that disappears mid-scan just yields nothing.
use crate::kernel::procfs;
use crate::verdict::evidence::{Category, Finding};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

/// One running process selected for scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub cmdline: String,
}

/// One maps line in a target process that carries a signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessMatch {
    pub pid: u32,
    pub cmdline: String,
    pub signature: String,
    pub line: String,
}

impl ProcessMatch {
    pub fn to_finding(&self) -> Finding {
        Finding::new(
            Category::DetectedProcessInjection,
            format!(
                "pid={} cmd={} sig={} line={}",
                self.pid, self.cmdline, self.signature, self.line
            ),
        )
    }
}

pub struct ProcessScanner {
    proc_root: PathBuf,
    read_capacity: usize,
}

impl ProcessScanner {
    pub fn new(proc_root: impl Into<PathBuf>, read_capacity: usize) -> Self {
        Self {
            proc_root: proc_root.into(),
            read_capacity,
        }
    }

    /// Numeric entries of the procfs root, ascending
    pub fn list_pids(&self) -> Vec<u32> {
        let entries = match std::fs::read_dir(&self.proc_root) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!(
                    "cannot enumerate {}: {}",
                    self.proc_root.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut pids: Vec<u32> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
            .filter(|pid| *pid > 0)
            .collect();
        pids.sort_unstable();
        pids
    }

    /// Command line with NUL separators rendered as spaces
    pub fn read_cmdline(&self, pid: u32) -> Option<String> {
        let path = self.pid_path(pid, "cmdline");
        let buffer = procfs::read_whole(&path, self.read_capacity).ok()?;
        let text = buffer.text();
        let cmdline = text.trim_end_matches('\0').replace('\0', " ");
        Some(cmdline)
    }

    /// Processes whose command line contains any of `targets`
    pub fn matching_processes(&self, targets: &[String]) -> Vec<ProcessRecord> {
        self.list_pids()
            .into_iter()
            .filter_map(|pid| {
                let cmdline = self.read_cmdline(pid)?;
                targets
                    .iter()
                    .any(|t| !t.is_empty() && cmdline.contains(t.as_str()))
                    .then_some(ProcessRecord { pid, cmdline })
            })
            .collect()
    }

    /// Maps lines of `process` carrying any of `signatures`
    pub fn scan_maps(&self, process: &ProcessRecord, signatures: &[String]) -> Vec<ProcessMatch> {
        let mut matches = Vec::new();
        let path = self.pid_path(process.pid, "maps");
        let scanned = procfs::for_each_line(&path, |line| {
            for signature in signatures.iter().filter(|s| !s.is_empty()) {
                if line.contains(signature.as_str()) {
                    matches.push(ProcessMatch {
                        pid: process.pid,
                        cmdline: process.cmdline.clone(),
                        signature: signature.clone(),
                        line: line.to_string(),
                    });
                }
            }
            ControlFlow::Continue(())
        });
        if let Err(e) = scanned {
            log::debug!("pid {} vanished or is unreadable: {}", process.pid, e);
        }
        matches
    }

    /// Full scan: select processes by command line, then scan their maps
    pub fn scan(&self, targets: &[String], signatures: &[String]) -> Vec<ProcessMatch> {
        self.matching_processes(targets)
            .iter()
            .flat_map(|process| self.scan_maps(process, signatures))
            .collect()
    }

    fn pid_path(&self, pid: u32, table: &str) -> PathBuf {
        self.proc_root.join(pid.to_string()).join(table)
    }
}

/// Convenience wrapper producing findings directly
pub fn scan_processes(
    proc_root: &Path,
    read_capacity: usize,
    targets: &[String],
    signatures: &[String],
) -> Vec<Finding> {
    ProcessScanner::new(proc_root, read_capacity)
        .scan(targets, signatures)
        .iter()
        .map(ProcessMatch::to_finding)
        .collect()
}
