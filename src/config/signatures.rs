/// Heuristic signature registry
///
/// Paths and substrings the probes look for. This is data: adding a
/// signature never changes engine behavior, so every list can be replaced
/// from the JSON config.
use serde::{Deserialize, Serialize};

const SU_PATHS: &[&str] = &[
    "/data/local/su",
    "/data/local/bin/su",
    "/data/local/xbin/su",
    "/sbin/su",
    "/su/bin/su",
    "/system/bin/su",
    "/system/bin/.ext/su",
    "/system/bin/failsafe/su",
    "/system/sd/xbin/su",
    "/system/usr/we-need-root/su",
    "/system/xbin/su",
    "/vendor/bin/su",
    "/magisk/su",
    "/cache/su",
    "/data/su",
    "/dev/su",
];

const MAGISK_PATHS: &[&str] = &[
    "/sbin/.magisk",
    "/sbin/magisk",
    "/data/adb/magisk",
    "/data/adb/modules",
    "/magisk",
    "/data/adb/magisk.db",
];

const MAGISK_MARKER_FILES: &[&str] = &[
    "/init.magisk.rc",
    "/dev/.magisk_unblock",
    "/cache/magisk.log",
    "/metadata/magisk",
];

const RESETPROP_PATHS: &[&str] = &[
    "/system/bin/resetprop",
    "/system/xbin/resetprop",
    "/sbin/resetprop",
    "/vendor/bin/resetprop",
    "/system/bin/.ext/.resetprop",
    "/data/local/tmp/resetprop",
];

const KSU_PATHS: &[&str] = &["/apex/com.kernelsu", "/data/ksu/modules.img"];

const GAPPS_PATHS: &[&str] = &[
    "/system/priv-app/GoogleGmsCore",
    "/data/app/com.google.android.gms-",
    "/system/app/GoogleServicesFramework",
];

const ADDON_PATHS: &[&str] = &[
    "/system/addon.d",
    "/system/etc/install-recovery.sh",
    "/vendor/addon.d",
];

/// Daemons and OTA leftovers installed by SuperSU-era root kits
const ROOT_DAEMON_PATHS: &[&str] = &[
    "/system/recovery-from-boot.p",
    "/system/etc/init.d/99SuperSUDaemon",
    "/dev/com.koushikdutta.superuser.daemon/",
    "/system/xbin/daemonsu",
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Every list the probes consult
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignatureSet {
    pub su_paths: Vec<String>,
    pub magisk_paths: Vec<String>,
    pub magisk_marker_files: Vec<String>,
    /// Substrings in the self mounts table written by magisk itself
    pub magisk_mount_markers: Vec<String>,
    /// Substrings of the whole mounts buffer checked from the isolated child
    pub mount_blacklist: Vec<String>,
    /// Library names that betray an injected loader in self maps
    pub library_markers: Vec<String>,
    /// Maps names attributed to zygisk-style assistants
    pub zygisk_markers: Vec<String>,
    /// A `.so` mapped from one of these locations counts as injection
    pub injection_markers: Vec<String>,
    pub log_markers: Vec<String>,
    /// Command-line substrings selecting processes for the tree scan
    pub scan_targets: Vec<String>,
    /// Maps substrings looked for in the selected processes
    pub scan_signatures: Vec<String>,
    pub resetprop_paths: Vec<String>,
    pub hosts_paths: Vec<String>,
    pub hosts_size_threshold: u64,
    pub modules_dir: String,
    pub hide_my_applist_modules: Vec<String>,
    pub app_dir: String,
    pub risky_app_markers: Vec<String>,
    pub ksu_paths: Vec<String>,
    pub gapps_paths: Vec<String>,
    pub framework_patch_paths: Vec<String>,
    pub addon_paths: Vec<String>,
    pub inotify_watch_path: String,
    pub custom_rom_markers: Vec<String>,
    pub vendor_sepolicy_path: String,
    pub debug_fingerprint_markers: Vec<String>,
    pub root_daemon_paths: Vec<String>,
    /// Substrings of `ro.build.tags` that mark a non-release signing key
    pub build_tag_markers: Vec<String>,
    /// Mount points that must never be mounted read-write
    pub read_only_mount_points: Vec<String>,
}

impl Default for SignatureSet {
    fn default() -> Self {
        Self {
            su_paths: owned(SU_PATHS),
            magisk_paths: owned(MAGISK_PATHS),
            magisk_marker_files: owned(MAGISK_MARKER_FILES),
            magisk_mount_markers: owned(&["/dev/magisk", "magisk.img"]),
            mount_blacklist: owned(&["magisk", "core/mirror", "core/img"]),
            library_markers: owned(&["magisk", "zygisk", "libsu"]),
            zygisk_markers: owned(&["zygisk", "ksu", "magisk"]),
            injection_markers: owned(&["/data/adb", "/magisk", "lsposed", "zygisk"]),
            log_markers: owned(&["zygisk", "denylist"]),
            scan_targets: owned(&["zygote", "system_server", "init"]),
            scan_signatures: owned(&["magisk", "zygisk"]),
            resetprop_paths: owned(RESETPROP_PATHS),
            hosts_paths: owned(&["/system/etc/hosts", "/etc/hosts"]),
            hosts_size_threshold: 2048,
            modules_dir: "/data/adb/modules".to_string(),
            hide_my_applist_modules: owned(&["hmap", "hide_my_applist", "hideapplist"]),
            app_dir: "/data/app".to_string(),
            risky_app_markers: owned(&["magisk", "superuser", "lsposed"]),
            ksu_paths: owned(KSU_PATHS),
            gapps_paths: owned(GAPPS_PATHS),
            framework_patch_paths: owned(&["/system/framework/XposedBridge.jar"]),
            addon_paths: owned(ADDON_PATHS),
            inotify_watch_path: "/data/adb".to_string(),
            custom_rom_markers: owned(&["lineage", "omni", "aosp"]),
            vendor_sepolicy_path: "/vendor/etc/selinux/vendor_sepolicy.cil".to_string(),
            debug_fingerprint_markers: owned(&["test-keys", "dev-keys", "debug"]),
            root_daemon_paths: owned(ROOT_DAEMON_PATHS),
            build_tag_markers: owned(&["test-keys"]),
            read_only_mount_points: owned(&["/system"]),
        }
    }
}

impl SignatureSet {
    /// Paths whose existence on their own means a magisk install
    pub fn magisk_file_indicators(&self) -> impl Iterator<Item = &str> {
        self.magisk_paths
            .iter()
            .chain(self.magisk_marker_files.iter())
            .map(String::as_str)
    }
}

/// True when `haystack` contains any of `needles`
pub fn contains_any<'a>(haystack: &str, needles: &'a [String]) -> Option<&'a str> {
    needles
        .iter()
        .map(String::as_str)
        .find(|needle| !needle.is_empty() && haystack.contains(needle))
}
