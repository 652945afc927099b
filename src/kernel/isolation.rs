/// Isolated probe execution
///
/// A probe runs in a forked child and reports back through one bit: exit
/// status 1 means positive, anything else means negative. The parent never
/// shares memory or descriptors with the probe's side effects.
///
/// State machine per invocation:
/// Forking -> ChildRunning | ParentWaiting -> Exited -> VerdictMapped.
/// There are no retries.
use crate::config::types::ProbeError;
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

const EXIT_POSITIVE: i32 = 1;
const EXIT_NEGATIVE: i32 = 0;

/// Seam over `fork(2)` so launch failure can be injected.
pub trait ProcessLauncher: Send + Sync {
    /// # Safety
    /// Same contract as `nix::unistd::fork`: the child may only run code
    /// that is safe after fork in a possibly multi-threaded parent.
    unsafe fn launch(&self) -> nix::Result<ForkResult>;
}

/// The real `fork(2)`
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFork;

impl ProcessLauncher for NativeFork {
    unsafe fn launch(&self) -> nix::Result<ForkResult> {
        fork()
    }
}

/// How one isolated run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsolationOutcome {
    Exited(i32),
    Signaled(Signal),
    /// Child outlived the deadline and was killed
    TimedOut,
    LaunchFailed(String),
    WaitFailed(String),
}

impl IsolationOutcome {
    /// Only a clean exit with status 1 is a positive verdict
    pub fn verdict(&self) -> bool {
        matches!(self, IsolationOutcome::Exited(EXIT_POSITIVE))
    }

    pub fn failure(&self) -> Option<ProbeError> {
        match self {
            IsolationOutcome::LaunchFailed(msg) => {
                Some(ProbeError::IsolationFailure(format!("fork: {}", msg)))
            }
            IsolationOutcome::WaitFailed(msg) => {
                Some(ProbeError::IsolationFailure(format!("waitpid: {}", msg)))
            }
            IsolationOutcome::TimedOut => Some(ProbeError::IsolationFailure(
                "child killed after deadline".to_string(),
            )),
            _ => None,
        }
    }
}

/// Runs probe closures in forked children, one at a time
pub struct IsolatedRunner {
    launcher: Box<dyn ProcessLauncher>,
    timeout: Option<Duration>,
    poll_interval: Duration,
}

impl IsolatedRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self::with_launcher(Box::new(NativeFork), timeout)
    }

    pub fn with_launcher(launcher: Box<dyn ProcessLauncher>, timeout: Option<Duration>) -> Self {
        Self {
            launcher,
            timeout,
            poll_interval: Duration::from_millis(5),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run `probe` in a child and map its exit status to an outcome
    pub fn run<F>(&self, probe: F) -> IsolationOutcome
    where
        F: FnOnce() -> bool,
    {
        match unsafe { self.launcher.launch() } {
            Err(e) => {
                log::warn!("isolated probe not launched: {}", e);
                IsolationOutcome::LaunchFailed(e.to_string())
            }
            Ok(ForkResult::Child) => {
                // A panicking probe found nothing.
                let positive = panic::catch_unwind(AssertUnwindSafe(probe)).unwrap_or(false);
                let code = if positive { EXIT_POSITIVE } else { EXIT_NEGATIVE };
                // _exit: no atexit handlers or stdio flushes inherited from the parent
                unsafe { libc::_exit(code) }
            }
            Ok(ForkResult::Parent { child }) => self.wait_for_child(child),
        }
    }

    /// Run `probe` isolated and return only the verdict
    pub fn run_isolated<F>(&self, probe: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        let outcome = self.run(probe);
        if let Some(err) = outcome.failure() {
            log::warn!("{}", err);
        }
        outcome.verdict()
    }

    fn wait_for_child(&self, child: Pid) -> IsolationOutcome {
        let started = Instant::now();
        let flags = self.timeout.map(|_| WaitPidFlag::WNOHANG);

        loop {
            match waitpid(child, flags) {
                Ok(WaitStatus::StillAlive) => {
                    if self.timeout.map_or(false, |limit| started.elapsed() > limit) {
                        terminate_child(child);
                        return IsolationOutcome::TimedOut;
                    }
                    std::thread::sleep(self.poll_interval);
                }
                Ok(WaitStatus::Exited(_, code)) => return IsolationOutcome::Exited(code),
                Ok(WaitStatus::Signaled(_, sig, _)) => return IsolationOutcome::Signaled(sig),
                Ok(_) => continue,
                Err(Errno::EINTR) => continue,
                Err(e) => return IsolationOutcome::WaitFailed(e.to_string()),
            }
        }
    }
}

impl Default for IsolatedRunner {
    fn default() -> Self {
        Self::new(Some(Duration::from_millis(
            crate::config::types::DEFAULT_ISOLATION_TIMEOUT_MS,
        )))
    }
}

/// SIGKILL the child and reap it so no zombie is left behind
fn terminate_child(child: Pid) {
    if let Err(e) = kill(child, Signal::SIGKILL) {
        log::warn!("SIGKILL to isolated child {} failed: {}", child, e);
    }
    loop {
        match waitpid(child, None) {
            Err(Errno::EINTR) => continue,
            Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) | Err(_) => break,
            Ok(_) => continue,
        }
    }
}
