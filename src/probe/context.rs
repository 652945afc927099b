/// Everything a probe is allowed to look at
use crate::config::loader::EngineConfig;
use crate::config::signatures::SignatureSet;
use crate::config::types::DEFAULT_READ_CAPACITY;
use crate::kernel::procfs::{self, LineScan};
use crate::probe::sources::{
    GetpropCommand, LogSource, LogcatCommand, PropertySource, StaticLog, StaticProperties,
};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

pub struct Environment {
    fs_root: PathBuf,
    proc_root: PathBuf,
    read_capacity: usize,
    signatures: SignatureSet,
    properties: Box<dyn PropertySource>,
    logs: Box<dyn LogSource>,
}

impl Environment {
    /// The live device: real filesystem, real procfs, real command sources
    pub fn host() -> Self {
        Self {
            fs_root: PathBuf::from("/"),
            proc_root: PathBuf::from("/proc"),
            read_capacity: DEFAULT_READ_CAPACITY,
            signatures: SignatureSet::default(),
            properties: Box::new(GetpropCommand),
            logs: Box::new(LogcatCommand),
        }
    }

    /// Host sources with roots, capacity and signatures taken from `config`
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::host()
            .with_fs_root(&config.fs_root)
            .with_proc_root(&config.proc_root)
            .with_read_capacity(config.read_capacity)
            .with_signatures(config.signatures.clone())
    }

    /// Fixture environment: given roots, no properties, empty log
    pub fn fixture(fs_root: impl Into<PathBuf>, proc_root: impl Into<PathBuf>) -> Self {
        Self::host()
            .with_fs_root(fs_root)
            .with_proc_root(proc_root)
            .with_properties(Box::new(StaticProperties::new()))
            .with_logs(Box::new(StaticLog::empty()))
    }

    pub fn with_fs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.fs_root = root.into();
        self
    }

    pub fn with_proc_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.proc_root = root.into();
        self
    }

    pub fn with_read_capacity(mut self, capacity: usize) -> Self {
        self.read_capacity = capacity;
        self
    }

    pub fn with_signatures(mut self, signatures: SignatureSet) -> Self {
        self.signatures = signatures;
        self
    }

    pub fn with_properties(mut self, properties: Box<dyn PropertySource>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_logs(mut self, logs: Box<dyn LogSource>) -> Self {
        self.logs = logs;
        self
    }

    pub fn signatures(&self) -> &SignatureSet {
        &self.signatures
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    pub fn read_capacity(&self) -> usize {
        self.read_capacity
    }

    /// Resolve an absolute device path under the filesystem root
    pub fn path(&self, device_path: &str) -> PathBuf {
        self.fs_root.join(device_path.trim_start_matches('/'))
    }

    /// Resolve a procfs-relative table path (`self/maps`, `1/mountinfo`)
    pub fn proc_path(&self, table: &str) -> PathBuf {
        self.proc_root.join(table.trim_start_matches('/'))
    }

    /// Existence check that follows symlinks, like access(F_OK).
    /// Errors, including a dangling link, mean absent.
    pub fn exists(&self, device_path: &str) -> bool {
        std::fs::metadata(self.path(device_path)).is_ok()
    }

    pub fn file_size(&self, device_path: &str) -> Option<u64> {
        std::fs::metadata(self.path(device_path)).ok().map(|m| m.len())
    }

    /// Sorted entry names of a device directory; empty when unreadable
    pub fn list_dir(&self, device_path: &str) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(self.path(device_path)) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().into_string().ok())
                .filter(|name| !name.starts_with('.'))
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Whole procfs table text
    pub fn proc_text(&self, table: &str) -> Option<String> {
        procfs::read_text(&self.proc_path(table), self.read_capacity)
    }

    /// Line scan over a procfs table; `None` when unavailable
    pub fn proc_lines<F>(&self, table: &str, visitor: F) -> Option<LineScan>
    where
        F: FnMut(&str) -> ControlFlow<()>,
    {
        match procfs::for_each_line(&self.proc_path(table), visitor) {
            Ok(scan) => Some(scan),
            Err(e) => {
                log::debug!("no evidence from this source: {}", e);
                None
            }
        }
    }

    /// Line scan over a regular device file
    pub fn file_lines<F>(&self, device_path: &str, visitor: F) -> Option<LineScan>
    where
        F: FnMut(&str) -> ControlFlow<()>,
    {
        procfs::for_each_line(&self.path(device_path), visitor).ok()
    }

    pub fn property(&self, key: &str) -> Option<String> {
        self.properties.property(key)
    }

    pub fn log_dump(&self) -> Option<String> {
        self.logs.dump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_rebased() {
        let env = Environment::fixture("/tmp/device", "/tmp/device-proc");
        assert_eq!(env.path("/data/adb/magisk"), PathBuf::from("/tmp/device/data/adb/magisk"));
        assert_eq!(env.proc_path("self/maps"), PathBuf::from("/tmp/device-proc/self/maps"));
        assert_eq!(Environment::host().path("/sbin/su"), PathBuf::from("/sbin/su"));
    }

    #[test]
    fn test_list_dir_sorted_without_hidden() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zeta", "alpha", ".hidden"] {
            std::fs::create_dir_all(dir.path().join("data/adb/modules").join(name)).unwrap();
        }
        let env = Environment::fixture(dir.path(), dir.path().join("proc"));
        assert_eq!(env.list_dir("/data/adb/modules"), vec!["alpha", "zeta"]);
        assert!(env.list_dir("/data/app").is_empty());
    }

    #[test]
    fn test_dangling_symlink_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let sbin = dir.path().join("sbin");
        std::fs::create_dir_all(&sbin).unwrap();
        std::os::unix::fs::symlink("/nonexistent/su", sbin.join("su")).unwrap();
        std::fs::write(sbin.join("magisk"), b"").unwrap();
        std::os::unix::fs::symlink("magisk", sbin.join("magisk64")).unwrap();

        let env = Environment::fixture(dir.path(), dir.path().join("proc"));
        assert!(!env.exists("/sbin/su"));
        assert!(env.exists("/sbin/magisk64"));
        assert!(env.exists("/sbin/magisk"));
    }

    #[test]
    fn test_fixture_sources_are_silent() {
        let env = Environment::fixture("/nonexistent", "/nonexistent");
        assert_eq!(env.property("ro.secure"), None);
        assert_eq!(env.log_dump(), None);
        assert!(env.proc_text("self/maps").is_none());
    }
}
