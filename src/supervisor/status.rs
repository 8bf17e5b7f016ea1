use super::Supervisor;
use super::outcome::{PortDetail, StatusReport};
use crate::ports::inspect_async;
use crate::server_config::ServerConfig;

impl Supervisor {
    /// Report whether a server is running by probing every configured port.
    ///
    /// Never fails: a missing config is `unconfigured`, and a store or probe
    /// error degrades to `unknown` carrying the error message.
    pub async fn status(&self, id: &str) -> StatusReport {
        match self.store.load(id) {
            Ok(Some(config)) => self.probe(id, &config).await,
            Ok(None) => StatusReport::unconfigured(id),
            Err(err) => {
                warn!("failed to load configuration for {id}: {err}");
                StatusReport::unknown(id, None, err.to_string())
            }
        }
    }

    /// Status of every configured server, in store order.
    pub async fn list(&self) -> crate::Result<Vec<StatusReport>> {
        let mut reports = vec![];
        for (id, config) in self.store.list()? {
            reports.push(self.probe(&id, &config).await);
        }
        Ok(reports)
    }

    async fn probe(&self, id: &str, config: &ServerConfig) -> StatusReport {
        let mut detail = Vec::with_capacity(config.ports.len());
        for &port in &config.ports {
            match inspect_async(&self.inspector, port).await {
                Ok(occupancy) => detail.push(PortDetail {
                    port,
                    running: occupancy.running,
                    pids: occupancy.pids,
                }),
                Err(err) => {
                    warn!("status of {id} unknown: {err}");
                    return StatusReport::unknown(id, config.primary_port(), err.to_string());
                }
            }
        }
        let launch = self.launch_record(id).await;
        let report = StatusReport::observed(id, config.primary_port(), detail, launch);
        trace!("status of {id}: {}", report.status);
        report
    }
}
