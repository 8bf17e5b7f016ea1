//! Server lifecycle management - start/stop/restart operations
//!
//! Each operation holds the server's lock for its whole duration and turns
//! every failure into an unsuccessful outcome instead of an error.

use super::Supervisor;
use super::outcome::{LaunchMode, PortPids, StartOutcome, StopOutcome};
use super::state::LaunchRecord;
use crate::error::ServerError;
use crate::ports::inspect_async;
use crate::procs::terminate_async;
use crate::reclaim::ReclaimResult;
use crate::server_config::ServerConfig;
use crate::shell::CommandLine;
use tokio::time;

/// Result of signalling every occupied port during a stop.
struct Stopped {
    stopped: Vec<PortPids>,
    failure: Option<ServerError>,
}

impl Supervisor {
    /// Free the server's ports and launch it
    pub async fn start(&self, id: &str) -> StartOutcome {
        self.launch(id, LaunchMode::Start).await
    }

    /// Same mechanics as `start`; the message says "restarted" when
    /// something had to be replaced.
    pub async fn restart(&self, id: &str) -> StartOutcome {
        self.launch(id, LaunchMode::Restart).await
    }

    async fn launch(&self, id: &str, mode: LaunchMode) -> StartOutcome {
        let _guard = self.lock_server(id).await;
        info!("{mode:?} requested for {id}");
        let mut reclaimed = vec![];
        let result = self.try_launch(id, &mut reclaimed).await;
        let replaced = reclaimed.into_iter().map(PortPids::from).collect();
        match result {
            Ok((pid, port)) => StartOutcome::launched(mode, id, pid, port, replaced),
            Err(err) => {
                warn!("failed to launch {id}: {err}");
                StartOutcome::failed(mode, id, &err, replaced)
            }
        }
    }

    /// Returns the launched pid and primary port. Ports freed along the way
    /// land in `reclaimed` even when a later step fails.
    async fn try_launch(
        &self,
        id: &str,
        reclaimed: &mut Vec<ReclaimResult>,
    ) -> crate::Result<(u32, u16)> {
        let config = self.load_config(id)?;
        let Some(port) = config.primary_port() else {
            return Err(ServerError::NoPortsConfigured { id: id.to_string() }.into());
        };
        // nothing gets killed for a command that could never be launched
        let command = CommandLine::parse(&config.command)?;

        self.reclaimer
            .reclaim_all(config.ports.iter().copied(), reclaimed)
            .await?;

        if !config.directory.is_dir() {
            return Err(ServerError::DirectoryNotFound {
                path: config.directory.clone(),
            }
            .into());
        }

        let pid = self.launcher.launch(&config.directory, &command)?;
        self.record_launch(
            id,
            LaunchRecord {
                pid,
                started_at: chrono::Local::now(),
                command: config.command.clone(),
                directory: config.directory.clone(),
            },
        )
        .await;

        Ok((pid, port))
    }

    /// Terminate whatever holds the server's ports
    pub async fn stop(&self, id: &str) -> StopOutcome {
        let _guard = self.lock_server(id).await;
        info!("stopping {id}");
        match self.try_stop(id).await {
            Ok(Stopped {
                stopped,
                failure: None,
            }) => {
                self.forget_launch(id).await;
                StopOutcome::stopped(id, stopped)
            }
            Ok(Stopped {
                stopped,
                failure: Some(err),
            }) => {
                let err = miette::Report::new(err);
                warn!("failed to fully stop {id}: {err}");
                StopOutcome::failed(id, stopped, &err)
            }
            Err(err) => {
                debug!("stop of {id} did nothing: {err}");
                StopOutcome::failed(id, vec![], &err)
            }
        }
    }

    async fn try_stop(&self, id: &str) -> crate::Result<Stopped> {
        let config = self.load_config(id)?;
        if config.ports.is_empty() {
            return Err(ServerError::NoPortsConfigured { id: id.to_string() }.into());
        }

        let mut occupied = vec![];
        for &port in &config.ports {
            let occupancy = inspect_async(&self.inspector, port).await?;
            if occupancy.running {
                occupied.push(PortPids {
                    port,
                    pids: occupancy.pids,
                });
            }
        }
        if occupied.is_empty() {
            return Err(ServerError::NotRunning { id: id.to_string() }.into());
        }

        let mut stopped = vec![];
        let mut failures = vec![];
        for entry in occupied {
            match terminate_async(&self.terminator, entry.pids.clone()).await {
                Ok(()) => stopped.push(entry),
                Err(ServerError::TerminateFailed { failures: f }) => failures.extend(f),
                Err(err) => return Err(err.into()),
            }
        }
        // one settle delay for the whole batch; stop does not re-verify
        time::sleep(self.settle_delay).await;

        let failure = (!failures.is_empty()).then_some(ServerError::TerminateFailed { failures });
        Ok(Stopped { stopped, failure })
    }

    fn load_config(&self, id: &str) -> crate::Result<ServerConfig> {
        self.store
            .load(id)?
            .ok_or_else(|| ServerError::ConfigurationMissing { id: id.to_string() }.into())
    }
}
