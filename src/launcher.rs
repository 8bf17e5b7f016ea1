//! Launching configured commands as detached background processes.

use crate::env;
use crate::error::ServerError;
use crate::shell::{CommandLine, Shell};
use std::path::Path;
use std::process::Stdio;

/// Starts a command in a working directory and returns its PID without
/// waiting for it to become ready. Readiness is observed later by probing
/// the configured ports.
pub trait Launcher: Send + Sync {
    fn launch(&self, dir: &Path, command: &CommandLine) -> Result<u32, ServerError>;
}

/// Launches through the platform shell, detached from the supervisor.
///
/// The child gets its own session on Unix (or a detached console on Windows)
/// so it outlives the supervisor and does not receive the supervisor's
/// terminal signals. Standard streams are discarded.
#[derive(Debug, Clone, Copy)]
pub struct DetachedLauncher {
    shell: Shell,
}

impl Default for DetachedLauncher {
    fn default() -> Self {
        Self {
            shell: *env::PORTWARDEN_SHELL,
        }
    }
}

impl DetachedLauncher {
    pub fn new(shell: Shell) -> Self {
        Self { shell }
    }

    fn build(&self, dir: &Path, command: &CommandLine) -> tokio::process::Command {
        let mut cmd = self.shell.command(command);
        cmd.current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);

        // Ensure servers can find user tools by using the original PATH
        if let Some(ref path) = *env::ORIGINAL_PATH {
            cmd.env("PATH", path);
        }

        #[cfg(unix)]
        // SAFETY: setsid is async-signal-safe and touches no parent state
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid()
                    .map(|_| ())
                    .map_err(std::io::Error::from)
            });
        }

        #[cfg(windows)]
        {
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
            cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
        }

        cmd
    }
}

impl Launcher for DetachedLauncher {
    fn launch(&self, dir: &Path, command: &CommandLine) -> Result<u32, ServerError> {
        info!("launching '{command}' in {} via {}", dir.display(), self.shell);
        let launch_failed = |source: std::io::Error| ServerError::LaunchFailed {
            command: command.to_string(),
            dir: dir.to_path_buf(),
            source,
        };
        let mut child = self.build(dir, command).spawn().map_err(launch_failed)?;
        let Some(pid) = child.id() else {
            return Err(launch_failed(std::io::Error::other(
                "process exited before its pid could be read",
            )));
        };

        // Reap the child when it exits so it never lingers as a zombie while
        // the supervisor is alive. The child is never killed from here.
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => debug!("launched pid {pid} exited with {status}"),
                Err(e) => debug!("failed to wait on launched pid {pid}: {e}"),
            }
        });

        info!("launched pid {pid}");
        Ok(pid)
    }
}
