/// Probes with observable side effects
///
/// Each of these leaves a trace (an inotify descriptor, open file handles on
/// su binaries) that hiding tools watch for. The registry flags them
/// `Isolation::Forked` so the trace dies with the child.
use crate::probe::mounts::mount_blacklist_hit;
use crate::probe::Environment;
use nix::sys::inotify::{AddWatchFlags, InitFlags, Inotify};
use nix::unistd::{access, AccessFlags};

/// An inotify watch on the magisk data directory can be installed
pub fn inotify_watch(env: &Environment) -> bool {
    let target = env.path(&env.signatures().inotify_watch_path);
    let inotify = match Inotify::init(InitFlags::empty()) {
        Ok(inotify) => inotify,
        Err(e) => {
            log::debug!("inotify unavailable: {}", e);
            return false;
        }
    };
    match inotify.add_watch(target.as_path(), AddWatchFlags::IN_ALL_EVENTS) {
        Ok(_) => {
            log::debug!("watch installed on {}", target.display());
            true
        }
        Err(_) => false,
    }
}

/// A magisk path is reachable from a freshly forked child
pub fn fork_access(env: &Environment) -> bool {
    env.signatures()
        .magisk_paths
        .iter()
        .any(|path| access(env.path(path).as_path(), AccessFlags::F_OK).is_ok())
}

/// su binaries readable, or magisk bind mounts in the self mounts buffer
pub fn magisk_hide(env: &Environment) -> bool {
    let su_reachable = env.signatures().su_paths.iter().any(|path| {
        let resolved = env.path(path);
        std::fs::File::open(&resolved).is_ok()
            || access(resolved.as_path(), AccessFlags::R_OK).is_ok()
    });
    su_reachable || mount_blacklist_hit(env)
}
