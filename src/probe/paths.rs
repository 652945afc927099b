/// Path-existence probes: su binaries, magisk state, module directories,
/// framework patches
use crate::probe::Environment;
use crate::verdict::evidence::{Category, EvidenceStore};

fn record_existing(env: &Environment, paths: &[String], category: Category, store: &mut EvidenceStore) {
    for path in paths {
        if env.exists(path) {
            store.add(category, path);
        }
    }
}

/// Any magisk path or marker file exists
pub fn magisk_files(env: &Environment) -> bool {
    let hit = env
        .signatures()
        .magisk_file_indicators()
        .find(|path| env.exists(path));
    if let Some(path) = hit {
        log::debug!("magisk file present: {}", path);
    }
    hit.is_some()
}

/// SuperSU daemon or a leftover OTA recovery patch
pub fn root_daemon_paths(env: &Environment) -> bool {
    match env.signatures().root_daemon_paths.iter().find(|path| env.exists(path)) {
        Some(path) => {
            log::debug!("root daemon path present: {}", path);
            true
        }
        None => false,
    }
}

pub fn collect_su_binaries(env: &Environment, store: &mut EvidenceStore) {
    record_existing(env, &env.signatures().su_paths, Category::FoundSuBinary, store);
}

pub fn collect_magisk_paths(env: &Environment, store: &mut EvidenceStore) {
    record_existing(env, &env.signatures().magisk_paths, Category::DetectedMagisk, store);
}

pub fn collect_resetprop(env: &Environment, store: &mut EvidenceStore) {
    record_existing(env, &env.signatures().resetprop_paths, Category::DetectedResetprop, store);
}

/// A hosts file this large has been fed an ad-block or redirect list
pub fn collect_hosts_file(env: &Environment, store: &mut EvidenceStore) {
    let sigs = env.signatures();
    for path in &sigs.hosts_paths {
        if env.file_size(path).map_or(false, |size| size > sigs.hosts_size_threshold) {
            store.add(Category::DetectedModifiedHostsFile, path);
        }
    }
}

/// Every installed module directory
pub fn collect_magisk_modules(env: &Environment, store: &mut EvidenceStore) {
    let modules_dir = &env.signatures().modules_dir;
    for name in env.list_dir(modules_dir) {
        store.add(
            Category::DetectedMagiskModule,
            &format!("{}/{}", modules_dir.trim_end_matches('/'), name),
        );
    }
}

pub fn collect_hide_my_applist(env: &Environment, store: &mut EvidenceStore) {
    let sigs = env.signatures();
    for name in &sigs.hide_my_applist_modules {
        let path = format!("{}/{}", sigs.modules_dir.trim_end_matches('/'), name);
        if env.exists(&path) {
            store.add(Category::DetectedHideMyApplist, &path);
        }
    }
}

/// Installed app directories named after root managers or hook frameworks
pub fn collect_risky_apps(env: &Environment, store: &mut EvidenceStore) {
    let sigs = env.signatures();
    for name in env.list_dir(&sigs.app_dir) {
        let lowered = name.to_lowercase();
        if sigs
            .risky_app_markers
            .iter()
            .any(|marker| !marker.is_empty() && lowered.contains(marker.as_str()))
        {
            store.add(Category::DetectedRiskyApp, &name);
        }
    }
}

pub fn collect_ksu_images(env: &Environment, store: &mut EvidenceStore) {
    record_existing(env, &env.signatures().ksu_paths, Category::DetectedKsuApModulesImg, store);
}

pub fn collect_gapps(env: &Environment, store: &mut EvidenceStore) {
    record_existing(env, &env.signatures().gapps_paths, Category::DetectedGapps, store);
}

pub fn collect_framework_patch(env: &Environment, store: &mut EvidenceStore) {
    record_existing(
        env,
        &env.signatures().framework_patch_paths,
        Category::DetectedFrameworkPatch,
        store,
    );
}

pub fn collect_addon_scripts(env: &Environment, store: &mut EvidenceStore) {
    record_existing(
        env,
        &env.signatures().addon_paths,
        Category::AddonDOrInstallRecoveryShExists,
        store,
    );
}

pub fn collect_root_daemons(env: &Environment, store: &mut EvidenceStore) {
    record_existing(env, &env.signatures().root_daemon_paths, Category::DetectedRootDaemon, store);
}
