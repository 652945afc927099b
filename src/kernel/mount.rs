/// Mount-set comparison between mount namespaces
///
/// Root-hiding tools bind-mount modified files only inside the caller's
/// namespace. Such mounts show up in /proc/self/mountinfo but have no
/// counterpart in /proc/1/mountinfo.
use crate::config::types::ProbeError;
use crate::kernel::procfs;
use std::path::{Path, PathBuf};

/// Mount point of one table line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountEntry {
    pub mount_point: String,
}

/// Extract the mount point from one line.
///
/// mountinfo-shaped lines (`id parent major:minor root mount_point ...`)
/// yield field 5; anything else yields the first `/`-prefixed token.
pub fn parse_mount_line(line: &str) -> Result<MountEntry, ProbeError> {
    let line = line.trim();
    let fields: Vec<&str> = line.split_whitespace().collect();

    let mountinfo_shaped = fields.len() >= 5
        && fields[0].parse::<u32>().is_ok()
        && fields[1].parse::<u32>().is_ok()
        && fields[4].starts_with('/');

    let raw = if mountinfo_shaped {
        fields[4]
    } else {
        fields
            .iter()
            .copied()
            .find(|f| f.starts_with('/'))
            .ok_or_else(|| ProbeError::MalformedEntry(line.to_string()))?
    };

    Ok(MountEntry {
        mount_point: normalize_mount_point(raw),
    })
}

fn normalize_mount_point(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Every mount point of a table, in table order. Malformed lines are skipped.
pub fn mount_points(table: &str) -> Vec<String> {
    table
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match parse_mount_line(line) {
            Ok(entry) => Some(entry.mount_point),
            Err(e) => {
                log::trace!("skipping {}", e);
                None
            }
        })
        .collect()
}

/// Two mount points match when they are equal after normalization.
/// `/data` therefore does not match `/data/adb/magisk`.
pub fn mounts_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    !a.is_empty() && !b.is_empty() && normalize_mount_point(a) == normalize_mount_point(b)
}

/// Mount points present in `self_table` with no match in `init_table`.
///
/// O(S×I) nested scan. Every unmatched self line yields one entry, in
/// self-table order; stacked mounts on one path are reported once per line.
pub fn hidden_mounts(self_table: &str, init_table: &str) -> Vec<String> {
    let init_points = mount_points(init_table);

    mount_points(self_table)
        .into_iter()
        .filter(|mp| !init_points.iter().any(|init| mounts_match(mp, init)))
        .collect()
}

/// Compare the live tables of the caller and init.
///
/// Either table being unreadable means no hidden mounts, not an error.
pub fn hidden_mounts_live(proc_root: &Path, fallback_capacity: usize) -> Vec<String> {
    let self_table = procfs::read_text(&proc_root.join("self/mountinfo"), fallback_capacity);
    let init_table = procfs::read_text(&proc_root.join("1/mountinfo"), fallback_capacity);

    match (self_table, init_table) {
        (Some(self_table), Some(init_table)) => hidden_mounts(&self_table, &init_table),
        _ => Vec::new(),
    }
}

/// Identity of a process's mount namespace (`mnt:[4026531840]`)
pub fn mount_namespace_id(proc_root: &Path, pid: &str) -> Option<PathBuf> {
    std::fs::read_link(proc_root.join(pid).join("ns/mnt")).ok()
}

/// True when the caller and init live in different mount namespaces.
/// Unreadable links count as "same".
pub fn namespaces_differ(proc_root: &Path) -> bool {
    match (
        mount_namespace_id(proc_root, "self"),
        mount_namespace_id(proc_root, "1"),
    ) {
        (Some(own), Some(init)) => {
            if own != init {
                log::debug!(
                    "mount namespace mismatch: self={} init={}",
                    own.display(),
                    init.display()
                );
            }
            own != init
        }
        _ => false,
    }
}
