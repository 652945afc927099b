/// Ordered probe registries for the two aggregation contracts
use crate::probe::{
    isolated, memory, mounts, paths, system, FindingProbe, FnFindingProbe, FnProbe, Probe,
};

/// Verdict probes, run in registration order
#[derive(Default)]
pub struct ProbeRegistry {
    probes: Vec<Box<dyn Probe>>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in verdict probes
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register(FnProbe::new("magisk_files", paths::magisk_files))
            .register(FnProbe::new("magisk_mounts", mounts::magisk_mounts))
            .register(FnProbe::new("loaded_libraries", memory::loaded_libraries))
            .register(FnProbe::isolated("inotify_watch", isolated::inotify_watch))
            .register(FnProbe::new("logcat_zygisk", system::logcat_zygisk))
            .register(FnProbe::isolated("fork_access", isolated::fork_access))
            .register(FnProbe::new("mount_namespace", mounts::mount_namespace))
            .register(FnProbe::new("process_maps", memory::process_maps))
            .register(FnProbe::new("hidepid", mounts::hidepid))
            .register(FnProbe::new("hidden_mounts", mounts::hidden_mounts_present))
            .register(FnProbe::isolated("magisk_hide", isolated::magisk_hide))
            .register(FnProbe::new("dangerous_props", system::dangerous_props))
            .register(FnProbe::new("build_tags", system::build_tags))
            .register(FnProbe::new("root_daemon_paths", paths::root_daemon_paths))
            .register(FnProbe::new("system_rw", mounts::system_rw));
        registry
    }

    pub fn register(&mut self, probe: impl Probe + 'static) -> &mut Self {
        self.probes.push(Box::new(probe));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Probe> {
        self.probes.iter().map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.iter().map(|p| p.id()).collect()
    }
}

/// Finding probes, run in registration order; evidence keeps this order
#[derive(Default)]
pub struct FindingRegistry {
    probes: Vec<Box<dyn FindingProbe>>,
}

impl FindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register(FnFindingProbe::new("su_binaries", paths::collect_su_binaries))
            .register(FnFindingProbe::new("magisk_paths", paths::collect_magisk_paths))
            .register(FnFindingProbe::new("zygisk", memory::collect_zygisk))
            .register(FnFindingProbe::new("mount_inconsistency", mounts::collect_mount_inconsistency))
            .register(FnFindingProbe::new("overlayfs", mounts::collect_overlayfs))
            .register(FnFindingProbe::new("resetprop", paths::collect_resetprop))
            .register(FnFindingProbe::new("hosts_file", paths::collect_hosts_file))
            .register(FnFindingProbe::new("magisk_modules", paths::collect_magisk_modules))
            .register(FnFindingProbe::new("risky_apps", paths::collect_risky_apps))
            .register(FnFindingProbe::new("ksu_images", paths::collect_ksu_images))
            .register(FnFindingProbe::new("bootloader", system::collect_bootloader))
            .register(FnFindingProbe::new("tee", system::collect_tee))
            .register(FnFindingProbe::new("injected_libraries", memory::collect_injected_libraries))
            .register(FnFindingProbe::new("hide_my_applist", paths::collect_hide_my_applist))
            .register(FnFindingProbe::new("custom_rom", system::collect_custom_rom))
            .register(FnFindingProbe::new("custom_kernel", system::collect_custom_kernel))
            .register(FnFindingProbe::new("gapps", paths::collect_gapps))
            .register(FnFindingProbe::new("framework_patch", paths::collect_framework_patch))
            .register(FnFindingProbe::new("addon_scripts", paths::collect_addon_scripts))
            .register(FnFindingProbe::new("debug_fingerprint", system::collect_debug_fingerprint))
            .register(FnFindingProbe::new("build_tags", system::collect_build_tags))
            .register(FnFindingProbe::new("root_daemons", paths::collect_root_daemons))
            .register(FnFindingProbe::new("system_rw", mounts::collect_system_rw))
            .register(FnFindingProbe::new("process_injection", memory::collect_process_injection));
        registry
    }

    pub fn register(&mut self, probe: impl FindingProbe + 'static) -> &mut Self {
        self.probes.push(Box::new(probe));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn FindingProbe> {
        self.probes.iter().map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.iter().map(|p| p.id()).collect()
    }
}
