use crate::error::{ServerError, TerminateFailure};
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};
use sysinfo::ProcessesToUpdate;

pub struct Procs {
    system: Mutex<sysinfo::System>,
}

pub static PROCS: Lazy<Procs> = Lazy::new(Procs::new);

impl Default for Procs {
    fn default() -> Self {
        Self::new()
    }
}

impl Procs {
    pub fn new() -> Self {
        let procs = Self {
            system: Mutex::new(sysinfo::System::new()),
        };
        procs.refresh_processes();
        procs
    }

    fn lock_system(&self) -> std::sync::MutexGuard<'_, sysinfo::System> {
        self.system.lock().unwrap_or_else(|poisoned| {
            warn!("System mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn title(&self, pid: u32) -> Option<String> {
        self.lock_system()
            .process(sysinfo::Pid::from_u32(pid))
            .map(|p| p.name().to_string_lossy().to_string())
    }

    pub fn is_running(&self, pid: u32) -> bool {
        self.lock_system()
            .process(sysinfo::Pid::from_u32(pid))
            .is_some()
    }

    /// Names for a set of PIDs, refreshing only those entries.
    pub fn titles(&self, pids: &[u32]) -> Vec<Option<String>> {
        self.refresh_pids(pids);
        pids.iter().map(|pid| self.title(*pid)).collect()
    }

    pub(crate) fn refresh_processes(&self) {
        self.lock_system()
            .refresh_processes(ProcessesToUpdate::All, true);
    }

    pub(crate) fn refresh_pids(&self, pids: &[u32]) {
        let pids: Vec<sysinfo::Pid> = pids.iter().map(|p| sysinfo::Pid::from_u32(*p)).collect();
        self.lock_system()
            .refresh_processes(ProcessesToUpdate::Some(&pids), true);
    }

    #[cfg(windows)]
    fn kill(&self, pid: u32) -> Result<(), String> {
        self.refresh_pids(&[pid]);
        match self.lock_system().process(sysinfo::Pid::from_u32(pid)) {
            Some(process) => {
                debug!("killing process {pid}");
                if process.kill() {
                    Ok(())
                } else {
                    Err("kill request was refused".to_string())
                }
            }
            // already gone
            None => Ok(()),
        }
    }
}

/// Sends a graceful termination signal to a batch of processes.
///
/// A PID that no longer exists counts as terminated. Every other per-PID
/// failure is collected into `ServerError::TerminateFailed`; the caller
/// decides whether that fails the whole operation.
pub trait ProcessTerminator: Send + Sync {
    fn terminate(&self, pids: &[u32]) -> Result<(), ServerError>;
}

/// Terminator that signals real OS processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsTerminator;

impl OsTerminator {
    #[cfg(unix)]
    fn signal(pid: u32) -> Result<(), String> {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let raw = i32::try_from(pid).map_err(|_| format!("pid {pid} out of range"))?;
        debug!("sending SIGTERM to pid {pid}");
        match kill(Pid::from_raw(raw), Signal::SIGTERM) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => {
                debug!("pid {pid} already exited");
                Ok(())
            }
            Err(errno) => Err(errno.desc().to_string()),
        }
    }

    #[cfg(windows)]
    fn signal(pid: u32) -> Result<(), String> {
        PROCS.kill(pid)
    }
}

impl ProcessTerminator for OsTerminator {
    fn terminate(&self, pids: &[u32]) -> Result<(), ServerError> {
        let failures: Vec<TerminateFailure> = pids
            .iter()
            .filter_map(|&pid| {
                Self::signal(pid)
                    .err()
                    .map(|reason| TerminateFailure { pid, reason })
            })
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ServerError::TerminateFailed { failures })
        }
    }
}

/// Signals on the blocking pool, mirroring how probes are run.
pub(crate) async fn terminate_async(
    terminator: &Arc<dyn ProcessTerminator>,
    pids: Vec<u32>,
) -> Result<(), ServerError> {
    let terminator = terminator.clone();
    let batch = pids.clone();
    tokio::task::spawn_blocking(move || terminator.terminate(&batch))
        .await
        .map_err(|e| ServerError::TerminateFailed {
            failures: pids
                .into_iter()
                .map(|pid| TerminateFailure {
                    pid,
                    reason: e.to_string(),
                })
                .collect(),
        })?
}
