/// Mount-table probes
use crate::config::signatures::contains_any;
use crate::kernel::{mount, procfs};
use crate::probe::Environment;
use crate::verdict::evidence::{Category, EvidenceStore};
use std::ops::ControlFlow;

/// tmpfs mounted somewhere under /dev by magisk
fn is_magisk_tmpfs(line: &str) -> bool {
    line.contains("tmpfs") && line.contains("/dev") && line.contains("magisk")
}

/// Self mounts table carries a magisk mount marker
pub fn magisk_mounts(env: &Environment) -> bool {
    let markers = &env.signatures().magisk_mount_markers;
    let mut found = false;
    env.proc_lines("self/mounts", |line| {
        if contains_any(line, markers).is_some() || is_magisk_tmpfs(line) {
            log::debug!("magisk mount: {}", line);
            found = true;
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    found
}

/// procfs mounted with hidepid=2
pub fn hidepid(env: &Environment) -> bool {
    let mut found = false;
    env.proc_lines("mounts", |line| {
        let mut fields = line.split_whitespace();
        let (source, target) = (fields.next(), fields.next());
        let is_proc = source == Some("proc") || target == Some("/proc");
        if is_proc && line.contains("hidepid=2") {
            found = true;
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    found
}

pub fn hidden_mounts_present(env: &Environment) -> bool {
    let hidden = mount::hidden_mounts_live(env.proc_root(), env.read_capacity());
    if let Some(first) = hidden.first() {
        log::debug!("{} mount(s) invisible to init, first {}", hidden.len(), first);
    }
    !hidden.is_empty()
}

pub fn mount_namespace(env: &Environment) -> bool {
    mount::namespaces_differ(env.proc_root())
}

/// Whole self mounts buffer mentions a blacklisted mount source
pub fn mount_blacklist_hit(env: &Environment) -> bool {
    let buffer = match procfs::read_whole(&env.proc_path("self/mounts"), env.read_capacity()) {
        Ok(buffer) => buffer,
        Err(e) => {
            log::debug!("no evidence from this source: {}", e);
            return false;
        }
    };
    contains_any(&buffer.text(), &env.signatures().mount_blacklist).is_some()
}

/// First mounts line putting a protected partition read-write.
/// Columns: source, mount point, type, options.
fn read_write_mount(env: &Environment) -> Option<String> {
    let protected = &env.signatures().read_only_mount_points;
    let mut hit = None;
    env.proc_lines("mounts", |line| {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return ControlFlow::Continue(());
        }
        let writable = fields[3].split(',').any(|opt| opt == "rw");
        if writable && protected.iter().any(|mp| mount::mounts_match(fields[1], mp)) {
            hit = Some(line.to_string());
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    hit
}

/// /system remounted read-write
pub fn system_rw(env: &Environment) -> bool {
    match read_write_mount(env) {
        Some(line) => {
            log::debug!("read-write system mount: {}", line);
            true
        }
        None => false,
    }
}

pub fn collect_system_rw(env: &Environment, store: &mut EvidenceStore) {
    if let Some(line) = read_write_mount(env) {
        store.add(Category::SystemMountedRw, &line);
    }
}

/// One finding per mount point hidden from init
pub fn collect_mount_inconsistency(env: &Environment, store: &mut EvidenceStore) {
    for mount_point in mount::hidden_mounts_live(env.proc_root(), env.read_capacity()) {
        store.add(Category::DetectedMountInconsistency, &mount_point);
    }
}

pub fn collect_overlayfs(env: &Environment, store: &mut EvidenceStore) {
    let mut supported = false;
    env.proc_lines("filesystems", |line| {
        if line.contains("overlay") {
            supported = true;
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    if supported {
        store.add(Category::DetectedOverlayfs, "overlay supported");
    }

    env.proc_lines("mounts", |line| {
        if line.contains("overlay") {
            store.add(Category::DetectedOverlayMounted, line);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write_proc(proc: &Path, table: &str, text: &str) {
        let path = proc.join(table);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn fixture() -> (tempfile::TempDir, Environment) {
        let dir = tempfile::tempdir().unwrap();
        let proc = dir.path().join("proc");
        fs::create_dir_all(&proc).unwrap();
        let env = Environment::fixture(dir.path(), &proc);
        (dir, env)
    }

    #[test]
    fn test_magisk_mounts() {
        let (dir, env) = fixture();
        let proc = dir.path().join("proc");
        write_proc(&proc, "self/mounts", "/dev/block/dm-0 / ext4 ro 0 0\n");
        assert!(!magisk_mounts(&env));

        write_proc(
            &proc,
            "self/mounts",
            "/dev/block/dm-0 / ext4 ro 0 0\ntmpfs /dev/xyz/.magisk tmpfs rw 0 0\n",
        );
        assert!(magisk_mounts(&env));

        write_proc(&proc, "self/mounts", "/dev/magisk/block /system ext4 ro 0 0\n");
        assert!(magisk_mounts(&env));
    }

    #[test]
    fn test_hidepid() {
        let (dir, env) = fixture();
        let proc = dir.path().join("proc");
        write_proc(&proc, "mounts", "proc /proc proc rw,relatime,gid=3009,hidepid=2 0 0\n");
        assert!(hidepid(&env));

        write_proc(&proc, "mounts", "proc /proc proc rw,relatime 0 0\n");
        assert!(!hidepid(&env));

        write_proc(&proc, "mounts", "tmpfs /mnt tmpfs rw,hidepid=2 0 0\n");
        assert!(!hidepid(&env));
    }

    #[test]
    fn test_hidden_mounts_collected() {
        let (dir, env) = fixture();
        let proc = dir.path().join("proc");
        write_proc(
            &proc,
            "self/mountinfo",
            "20 1 253:0 / /data rw - ext4 /dev/dm-0 rw\n\
             21 1 253:1 / /system ro - ext4 /dev/dm-1 ro\n\
             40 20 7:3 / /data/adb/magisk rw - ext4 /dev/loop3 rw\n",
        );
        write_proc(
            &proc,
            "1/mountinfo",
            "20 1 253:0 / /data rw - ext4 /dev/dm-0 rw\n\
             21 1 253:1 / /system ro - ext4 /dev/dm-1 ro\n",
        );

        assert!(hidden_mounts_present(&env));
        let mut store = EvidenceStore::new(8, 1024);
        collect_mount_inconsistency(&env, &mut store);
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].category(), Category::DetectedMountInconsistency);
        assert_eq!(store.entries()[0].detail(), "/data/adb/magisk");
    }

    #[test]
    fn test_stacked_bind_mounts_each_recorded() {
        let (dir, env) = fixture();
        let proc = dir.path().join("proc");
        write_proc(
            &proc,
            "self/mountinfo",
            "20 1 253:0 / /data rw - ext4 /dev/dm-0 rw\n\
             70 20 7:3 / /system/bin/app_process64 ro - ext4 /dev/loop3 ro\n\
             71 70 7:4 / /system/bin/app_process64 ro - ext4 /dev/loop4 ro\n",
        );
        write_proc(&proc, "1/mountinfo", "20 1 253:0 / /data rw - ext4 /dev/dm-0 rw\n");

        let mut store = EvidenceStore::new(8, 1024);
        collect_mount_inconsistency(&env, &mut store);
        let details: Vec<&str> = store.entries().iter().map(|e| e.detail()).collect();
        assert_eq!(
            details,
            vec!["/system/bin/app_process64", "/system/bin/app_process64"]
        );
    }

    #[test]
    fn test_unreadable_init_table_hides_nothing() {
        let (dir, env) = fixture();
        write_proc(&dir.path().join("proc"), "self/mountinfo", "40 20 7:3 / /data/adb/magisk rw\n");
        assert!(!hidden_mounts_present(&env));
    }

    #[test]
    fn test_mount_blacklist() {
        let (dir, env) = fixture();
        let proc = dir.path().join("proc");
        assert!(!mount_blacklist_hit(&env));

        write_proc(&proc, "self/mounts", "/sbin/.magisk/block/system_root /system ext4 ro 0 0\n");
        assert!(mount_blacklist_hit(&env));

        write_proc(&proc, "self/mounts", "/dev/block/dm-0 / ext4 ro 0 0\n");
        assert!(!mount_blacklist_hit(&env));
    }

    #[test]
    fn test_system_rw() {
        let (dir, env) = fixture();
        let proc = dir.path().join("proc");
        write_proc(
            &proc,
            "mounts",
            "/dev/block/dm-0 /system ext4 ro,seclabel,relatime 0 0
             /dev/block/dm-5 /data f2fs rw,lazytime 0 0
             /dev/block/dm-7 /system_ext ext4 rw 0 0
",
        );
        assert!(!system_rw(&env));

        write_proc(
            &proc,
            "mounts",
            "/dev/block/dm-5 /data f2fs rw,lazytime 0 0
             /dev/block/dm-0 /system ext4 rw,seclabel,relatime 0 0
",
        );
        assert!(system_rw(&env));
        let mut store = EvidenceStore::new(4, 1024);
        collect_system_rw(&env, &mut store);
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].category(), Category::SystemMountedRw);
        assert_eq!(store.entries()[0].detail(), "/dev/block/dm-0 /system ext4 rw,seclabel,relatime 0 0");
    }

    #[test]
    fn test_overlay_findings() {
        let (dir, env) = fixture();
        let proc = dir.path().join("proc");
        write_proc(&proc, "filesystems", "nodev\tproc\nnodev\toverlay\n\text4\n");
        write_proc(
            &proc,
            "mounts",
            "overlay /system/etc overlay ro 0 0\noverlay /vendor overlay ro 0 0\n",
        );

        let mut store = EvidenceStore::new(8, 1024);
        collect_overlayfs(&env, &mut store);
        let records: Vec<(Category, &str)> = store
            .entries()
            .iter()
            .map(|e| (e.category(), e.detail()))
            .collect();
        assert_eq!(
            records,
            vec![
                (Category::DetectedOverlayfs, "overlay supported"),
                (Category::DetectedOverlayMounted, "overlay /system/etc overlay ro 0 0"),
            ]
        );
    }

    #[test]
    fn test_missing_tables_yield_nothing() {
        let (_dir, env) = fixture();
        assert!(!magisk_mounts(&env));
        assert!(!hidepid(&env));
        assert!(!mount_namespace(&env));
        assert!(!system_rw(&env));
        let mut store = EvidenceStore::new(8, 1024);
        collect_overlayfs(&env, &mut store);
        collect_mount_inconsistency(&env, &mut store);
        assert!(store.is_empty());
    }
}
