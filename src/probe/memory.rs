/// Memory-map probes: injected loaders in our own maps and in other processes
use crate::config::signatures::contains_any;
use crate::kernel::process::ProcessScanner;
use crate::probe::Environment;
use crate::verdict::evidence::{Category, EvidenceStore};
use std::ops::ControlFlow;

/// Sample lines kept for anonymous rwx mappings
const ANON_RWX_SAMPLES: usize = 5;

/// `addr perms offset dev inode [pathname]` -> writable+executable and
/// not backed by a file
fn is_anonymous_rwx(line: &str) -> bool {
    let mut fields = line.split_whitespace();
    let perms = fields.nth(1).unwrap_or("");
    if !perms.starts_with("rwx") {
        return false;
    }
    match fields.nth(3) {
        None => true,
        Some(path) => path.contains("anon"),
    }
}

/// Self maps mention a known loader library
pub fn loaded_libraries(env: &Environment) -> bool {
    let markers = &env.signatures().library_markers;
    let mut found = false;
    env.proc_lines("self/maps", |line| {
        if let Some(marker) = contains_any(line, markers) {
            log::debug!("suspicious library ({}): {}", marker, line);
            found = true;
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    found
}

/// Core processes carry injected-library signatures in their maps
pub fn process_maps(env: &Environment) -> bool {
    let sigs = env.signatures();
    let matches = ProcessScanner::new(env.proc_root(), env.read_capacity())
        .scan(&sigs.scan_targets, &sigs.scan_signatures);
    if let Some(first) = matches.first() {
        log::debug!(
            "signature {} in pid {} ({})",
            first.signature,
            first.pid,
            first.cmdline
        );
    }
    !matches.is_empty()
}

/// Zygisk-style loaders: anonymous rwx regions and named assistant mappings
pub fn collect_zygisk(env: &Environment, store: &mut EvidenceStore) {
    let markers = &env.signatures().zygisk_markers;
    let mut anon_rwx = 0usize;

    let scanned = env.proc_lines("self/maps", |line| {
        if is_anonymous_rwx(line) {
            anon_rwx += 1;
            if anon_rwx <= ANON_RWX_SAMPLES {
                store.add(Category::DetectedZygisk, line);
            }
        }
        if contains_any(line, markers).is_some() {
            store.add(Category::DetectedZygiskAssistant, line);
        }
        ControlFlow::Continue(())
    });

    if scanned.is_some() && anon_rwx > 0 {
        store.add(Category::DetectedZygiskNext, &format!("anon_rwx={}", anon_rwx));
    }
}

/// Shared objects mapped from root-manager locations
pub fn collect_injected_libraries(env: &Environment, store: &mut EvidenceStore) {
    let markers = &env.signatures().injection_markers;
    env.proc_lines("self/maps", |line| {
        if line.contains(".so") && contains_any(line, markers).is_some() {
            store.add(Category::FoundInjection, line);
        }
        if line.contains("lsposed") {
            store.add(Category::DetectedLsposed, line);
        }
        ControlFlow::Continue(())
    });
}

pub fn collect_process_injection(env: &Environment, store: &mut EvidenceStore) {
    let sigs = env.signatures();
    let scanner = ProcessScanner::new(env.proc_root(), env.read_capacity());
    for hit in scanner.scan(&sigs.scan_targets, &sigs.scan_signatures) {
        store.push(hit.to_finding());
    }
}
