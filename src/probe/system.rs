/// Property, log and kernel-identity probes
use crate::config::signatures::contains_any;
use crate::probe::Environment;
use crate::verdict::evidence::{Category, EvidenceStore};
use std::ops::ControlFlow;

const VERIFIED_BOOT_STATE: &str = "ro.boot.verifiedbootstate";
const OEM_UNLOCK_SUPPORTED: &str = "ro.oem_unlock_supported";
const BUILD_FINGERPRINT: &str = "ro.build.fingerprint";
const BUILD_TAGS: &str = "ro.build.tags";

/// Log buffer mentions zygisk or the denylist
pub fn logcat_zygisk(env: &Environment) -> bool {
    let dump = match env.log_dump() {
        Some(dump) => dump,
        None => return false,
    };
    let markers = &env.signatures().log_markers;
    match dump.lines().find(|line| contains_any(line, markers).is_some()) {
        Some(line) => {
            log::debug!("log marker: {}", line);
            true
        }
        None => false,
    }
}

/// Debuggable or insecure build
pub fn dangerous_props(env: &Environment) -> bool {
    let debuggable = env.property("ro.debuggable").as_deref() == Some("1");
    let insecure = env.property("ro.secure").as_deref() == Some("0");
    if debuggable || insecure {
        log::debug!("dangerous props: debuggable={} insecure={}", debuggable, insecure);
    }
    debuggable || insecure
}

/// Build signed with test keys
pub fn build_tags(env: &Environment) -> bool {
    signed_with_test_keys(env).is_some()
}

fn signed_with_test_keys(env: &Environment) -> Option<String> {
    let tags = env.property(BUILD_TAGS)?;
    contains_any(&tags, &env.signatures().build_tag_markers)?;
    log::debug!("build tags: {}", tags);
    Some(tags)
}

pub fn collect_build_tags(env: &Environment, store: &mut EvidenceStore) {
    if let Some(tags) = signed_with_test_keys(env) {
        store.add(Category::TestKeysBuildTags, &tags);
    }
}

pub fn collect_bootloader(env: &Environment, store: &mut EvidenceStore) {
    if let Some(state) = env.property(VERIFIED_BOOT_STATE) {
        if ["orange", "unlocked", "unknown"].iter().any(|s| state.contains(s)) {
            store.add(Category::BootloaderUnlocked, &state);
        }
    }
    if let Some(supported) = env.property(OEM_UNLOCK_SUPPORTED) {
        if supported.contains('1') {
            store.add(Category::OemUnlockingEnabled, &supported);
        }
    }
}

/// Verified boot reports a state the TEE would refuse to attest
pub fn collect_tee(env: &Environment, store: &mut EvidenceStore) {
    if let Some(state) = env.property(VERIFIED_BOOT_STATE) {
        if state.contains("orange") || state.contains("failed") {
            store.add(Category::TeeIsBroken, &state);
        }
    }
}

/// Custom ROM fingerprint; the vendor sepolicy is only consulted once the
/// fingerprint already points at one
pub fn collect_custom_rom(env: &Environment, store: &mut EvidenceStore) {
    let sigs = env.signatures();
    let fingerprint = match env.property(BUILD_FINGERPRINT) {
        Some(fp) => fp,
        None => return,
    };
    if contains_any(&fingerprint, &sigs.custom_rom_markers).is_none() {
        return;
    }
    store.add(Category::DetectedLineageos, &fingerprint);

    let mut lineage_policy = false;
    env.file_lines(&sigs.vendor_sepolicy_path, |line| {
        if line.contains("lineage") {
            lineage_policy = true;
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    if lineage_policy {
        store.add(Category::VendorSepolicyContainsLineage, "vendor_sepolicy.cil");
    }
}

/// Kernel banner not built the stock way
pub fn collect_custom_kernel(env: &Environment, store: &mut EvidenceStore) {
    let mut banner = None;
    env.proc_lines("version", |line| {
        banner = Some(line.to_string());
        ControlFlow::Break(())
    });
    if let Some(banner) = banner {
        if !banner.contains("android") || banner.contains("gcc") {
            store.add(Category::DetectedCustomKernel, &banner);
        }
    }
}

pub fn collect_debug_fingerprint(env: &Environment, store: &mut EvidenceStore) {
    if let Some(fingerprint) = env.property(BUILD_FINGERPRINT) {
        if contains_any(&fingerprint, &env.signatures().debug_fingerprint_markers).is_some() {
            store.add(Category::DebugFingerprintDetected, &fingerprint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::sources::{StaticLog, StaticProperties};
    use std::fs;

    fn with_props(props: StaticProperties) -> (tempfile::TempDir, Environment) {
        let dir = tempfile::tempdir().unwrap();
        let env = Environment::fixture(dir.path(), dir.path().join("proc"))
            .with_properties(Box::new(props));
        (dir, env)
    }

    fn records(store: &EvidenceStore) -> Vec<(Category, String)> {
        store
            .entries()
            .iter()
            .map(|e| (e.category(), e.detail().to_string()))
            .collect()
    }

    #[test]
    fn test_dangerous_props() {
        let (_d, env) = with_props(StaticProperties::new().with("ro.debuggable", "0").with("ro.secure", "1"));
        assert!(!dangerous_props(&env));

        let (_d, env) = with_props(StaticProperties::new().with("ro.debuggable", "1"));
        assert!(dangerous_props(&env));

        let (_d, env) = with_props(StaticProperties::new().with("ro.secure", "0\n"));
        assert!(dangerous_props(&env));

        let (_d, env) = with_props(StaticProperties::new());
        assert!(!dangerous_props(&env), "unset properties are not evidence");
    }

    #[test]
    fn test_build_tags() {
        let (_d, env) = with_props(StaticProperties::new().with(BUILD_TAGS, "release-keys"));
        assert!(!build_tags(&env));

        let (_d, env) = with_props(StaticProperties::new());
        assert!(!build_tags(&env));

        let (_d, env) = with_props(StaticProperties::new().with(BUILD_TAGS, "dev-keys,test-keys"));
        assert!(build_tags(&env));
        let mut store = EvidenceStore::new(4, 1024);
        collect_build_tags(&env, &mut store);
        assert_eq!(
            records(&store),
            vec![(Category::TestKeysBuildTags, "dev-keys,test-keys".to_string())]
        );
    }

    #[test]
    fn test_logcat_zygisk() {
        let dir = tempfile::tempdir().unwrap();
        let env = Environment::fixture(dir.path(), dir.path())
            .with_logs(Box::new(StaticLog::text("I/init: boot\nW/Magisk: zygisk: loaded\n")));
        assert!(logcat_zygisk(&env));

        let env = env.with_logs(Box::new(StaticLog::text("I/init: boot\n")));
        assert!(!logcat_zygisk(&env));

        let env = env.with_logs(Box::new(StaticLog::empty()));
        assert!(!logcat_zygisk(&env));
    }

    #[test]
    fn test_bootloader_and_tee() {
        let (_d, env) = with_props(
            StaticProperties::new()
                .with(VERIFIED_BOOT_STATE, "orange")
                .with(OEM_UNLOCK_SUPPORTED, "1"),
        );
        let mut store = EvidenceStore::new(8, 1024);
        collect_bootloader(&env, &mut store);
        collect_tee(&env, &mut store);
        assert_eq!(
            records(&store),
            vec![
                (Category::BootloaderUnlocked, "orange".to_string()),
                (Category::OemUnlockingEnabled, "1".to_string()),
                (Category::TeeIsBroken, "orange".to_string()),
            ]
        );

        let (_d, env) = with_props(StaticProperties::new().with(VERIFIED_BOOT_STATE, "green"));
        let mut store = EvidenceStore::new(8, 1024);
        collect_bootloader(&env, &mut store);
        collect_tee(&env, &mut store);
        assert!(store.is_empty());
    }

    #[test]
    fn test_custom_rom_and_sepolicy() {
        let (dir, env) = with_props(
            StaticProperties::new().with(BUILD_FINGERPRINT, "lineage/sunfish/sunfish:13/TQ3A/eng.user:userdebug/test-keys"),
        );
        let policy = dir.path().join("vendor/etc/selinux/vendor_sepolicy.cil");
        fs::create_dir_all(policy.parent().unwrap()).unwrap();
        fs::write(&policy, "(allow vendor_init lineage_prop (file (read)))\n").unwrap();

        let mut store = EvidenceStore::new(8, 1024);
        collect_custom_rom(&env, &mut store);
        collect_debug_fingerprint(&env, &mut store);
        let categories: Vec<Category> = store.entries().iter().map(|e| e.category()).collect();
        assert_eq!(
            categories,
            vec![
                Category::DetectedLineageos,
                Category::VendorSepolicyContainsLineage,
                Category::DebugFingerprintDetected,
            ]
        );
        assert_eq!(store.entries()[1].detail(), "vendor_sepolicy.cil");
    }

    #[test]
    fn test_stock_fingerprint_skips_sepolicy() {
        let (dir, env) = with_props(
            StaticProperties::new().with(BUILD_FINGERPRINT, "google/oriole/oriole:14/UQ1A/1234:user/release-keys"),
        );
        let policy = dir.path().join("vendor/etc/selinux/vendor_sepolicy.cil");
        fs::create_dir_all(policy.parent().unwrap()).unwrap();
        fs::write(&policy, "lineage\n").unwrap();

        let mut store = EvidenceStore::new(8, 1024);
        collect_custom_rom(&env, &mut store);
        collect_debug_fingerprint(&env, &mut store);
        assert!(store.is_empty());
    }

    #[test]
    fn test_custom_kernel() {
        let dir = tempfile::tempdir().unwrap();
        let proc = dir.path().join("proc");
        fs::create_dir_all(&proc).unwrap();
        let env = Environment::fixture(dir.path(), &proc);

        fs::write(proc.join("version"), "Linux version 5.10.157-android13-4-00001 (clang version 14)\n").unwrap();
        let mut store = EvidenceStore::new(8, 1024);
        collect_custom_kernel(&env, &mut store);
        assert!(store.is_empty());

        fs::write(proc.join("version"), "Linux version 5.10.157-kirisakura (gcc version 12.2)\n").unwrap();
        collect_custom_kernel(&env, &mut store);
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].category(), Category::DetectedCustomKernel);
    }
}
