/// Evidence entries and the bounded evidence store
///
/// One store lives for exactly one aggregation pass. It is filled by the
/// in-process finding probes and drained by the caller; isolated probes
/// never see it.
use serde::Serialize;
use std::fmt;

/// Fixed category vocabulary for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    FoundSuBinary,
    DetectedMagisk,
    DetectedZygisk,
    DetectedZygiskAssistant,
    DetectedZygiskNext,
    DetectedMountInconsistency,
    DetectedOverlayfs,
    DetectedOverlayMounted,
    DetectedResetprop,
    DetectedModifiedHostsFile,
    DetectedMagiskModule,
    DetectedRiskyApp,
    DetectedKsuApModulesImg,
    BootloaderUnlocked,
    OemUnlockingEnabled,
    TeeIsBroken,
    FoundInjection,
    DetectedLsposed,
    DetectedHideMyApplist,
    DetectedLineageos,
    VendorSepolicyContainsLineage,
    DetectedCustomKernel,
    DetectedGapps,
    DetectedFrameworkPatch,
    AddonDOrInstallRecoveryShExists,
    DebugFingerprintDetected,
    DetectedProcessInjection,
    TestKeysBuildTags,
    DetectedRootDaemon,
    SystemMountedRw,
}

impl Category {
    pub const ALL: [Category; 30] = [
        Category::FoundSuBinary,
        Category::DetectedMagisk,
        Category::DetectedZygisk,
        Category::DetectedZygiskAssistant,
        Category::DetectedZygiskNext,
        Category::DetectedMountInconsistency,
        Category::DetectedOverlayfs,
        Category::DetectedOverlayMounted,
        Category::DetectedResetprop,
        Category::DetectedModifiedHostsFile,
        Category::DetectedMagiskModule,
        Category::DetectedRiskyApp,
        Category::DetectedKsuApModulesImg,
        Category::BootloaderUnlocked,
        Category::OemUnlockingEnabled,
        Category::TeeIsBroken,
        Category::FoundInjection,
        Category::DetectedLsposed,
        Category::DetectedHideMyApplist,
        Category::DetectedLineageos,
        Category::VendorSepolicyContainsLineage,
        Category::DetectedCustomKernel,
        Category::DetectedGapps,
        Category::DetectedFrameworkPatch,
        Category::AddonDOrInstallRecoveryShExists,
        Category::DebugFingerprintDetected,
        Category::DetectedProcessInjection,
        Category::TestKeysBuildTags,
        Category::DetectedRootDaemon,
        Category::SystemMountedRw,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::FoundSuBinary => "found_su_binary",
            Category::DetectedMagisk => "detected_magisk",
            Category::DetectedZygisk => "detected_zygisk",
            Category::DetectedZygiskAssistant => "detected_zygisk_assistant",
            Category::DetectedZygiskNext => "detected_zygisk_next",
            Category::DetectedMountInconsistency => "detected_mount_inconsistency",
            Category::DetectedOverlayfs => "detected_overlayfs",
            Category::DetectedOverlayMounted => "detected_overlay_mounted",
            Category::DetectedResetprop => "detected_resetprop",
            Category::DetectedModifiedHostsFile => "detected_modified_hosts_file",
            Category::DetectedMagiskModule => "detected_magisk_module",
            Category::DetectedRiskyApp => "detected_risky_app",
            Category::DetectedKsuApModulesImg => "detected_ksu_ap_modules_img",
            Category::BootloaderUnlocked => "bootloader_unlocked",
            Category::OemUnlockingEnabled => "oem_unlocking_enabled",
            Category::TeeIsBroken => "tee_is_broken",
            Category::FoundInjection => "found_injection",
            Category::DetectedLsposed => "detected_lsposed",
            Category::DetectedHideMyApplist => "detected_hide_my_applist",
            Category::DetectedLineageos => "detected_lineageos",
            Category::VendorSepolicyContainsLineage => "vendor_sepolicy_contains_lineage",
            Category::DetectedCustomKernel => "detected_custom_kernel",
            Category::DetectedGapps => "detected_gapps",
            Category::DetectedFrameworkPatch => "detected_framework_patch",
            Category::AddonDOrInstallRecoveryShExists => "addon_d_or_install_recovery_sh_exists",
            Category::DebugFingerprintDetected => "debug_fingerprint_detected",
            Category::DetectedProcessInjection => "detected_process_injection",
            Category::TestKeysBuildTags => "test_keys_build_tags",
            Category::DetectedRootDaemon => "detected_root_daemon",
            Category::SystemMountedRw => "system_mounted_rw",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finding not yet placed in a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub category: Category,
    pub detail: String,
}

impl Finding {
    pub fn new(category: Category, detail: impl Into<String>) -> Self {
        Self {
            category,
            detail: detail.into(),
        }
    }
}

/// One stored finding. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evidence {
    index: usize,
    category: Category,
    detail: String,
}

impl Evidence {
    /// Discovery order within the pass
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// Truncate to at most `max_chars` characters without splitting a char
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Bounded, append-only evidence collection.
///
/// Once `capacity` entries are stored every further `add` is a silent no-op.
#[derive(Debug, Clone)]
pub struct EvidenceStore {
    entries: Vec<Evidence>,
    capacity: usize,
    detail_max_len: usize,
    dropped: usize,
}

impl EvidenceStore {
    pub fn new(capacity: usize, detail_max_len: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.min(256)),
            capacity,
            detail_max_len,
            dropped: 0,
        }
    }

    /// Append one finding if capacity remains
    pub fn add(&mut self, category: Category, detail: &str) {
        if self.is_full() {
            self.dropped += 1;
            return;
        }
        let detail = truncate_chars(detail.trim_end_matches(['\n', '\r']), self.detail_max_len);
        self.entries.push(Evidence {
            index: self.entries.len(),
            category,
            detail: detail.to_string(),
        });
    }

    pub fn push(&mut self, finding: Finding) {
        self.add(finding.category, &finding.detail);
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            self.push(finding);
        }
    }

    pub fn entries(&self) -> &[Evidence] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Evidence> {
        self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.dropped = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Findings discarded because the store was full
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
