//! Forcibly freeing ports before a launch.

use crate::error::ServerError;
use crate::ports::{PortInspector, inspect_async};
use crate::procs::{ProcessTerminator, terminate_async};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

/// Outcome of reclaiming one port.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReclaimResult {
    pub port: u16,
    pub freed: bool,
    /// The PIDs that held the port before it was reclaimed.
    pub pids: Vec<u32>,
}

impl ReclaimResult {
    fn untouched(port: u16) -> Self {
        Self {
            port,
            freed: false,
            pids: vec![],
        }
    }
}

#[derive(Clone)]
pub struct PortReclaimer {
    inspector: Arc<dyn PortInspector>,
    terminator: Arc<dyn ProcessTerminator>,
    settle_delay: Duration,
}

impl PortReclaimer {
    pub fn new(
        inspector: Arc<dyn PortInspector>,
        terminator: Arc<dyn ProcessTerminator>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            inspector,
            terminator,
            settle_delay,
        }
    }

    /// Guarantees `port` is free: terminate its occupants, wait the settle
    /// delay, then check again. A port that is still bound afterwards is a
    /// `PortStillBound` error; there is no automatic retry.
    pub async fn reclaim(&self, port: u16) -> Result<ReclaimResult, ServerError> {
        let occupancy = inspect_async(&self.inspector, port).await?;
        if !occupancy.running {
            trace!("port {port} already free");
            return Ok(ReclaimResult::untouched(port));
        }

        info!("reclaiming port {port} from pid(s) {:?}", occupancy.pids);
        if let Err(err) = terminate_async(&self.terminator, occupancy.pids.clone()).await {
            // the re-check below decides whether the port is usable
            warn!("while reclaiming port {port}: {err}");
        }
        time::sleep(self.settle_delay).await;

        let after = inspect_async(&self.inspector, port).await?;
        if after.running {
            warn!("port {port} still bound by pid(s) {:?}", after.pids);
            return Err(ServerError::PortStillBound {
                port,
                pids: after.pids,
            });
        }
        Ok(ReclaimResult {
            port,
            freed: true,
            pids: occupancy.pids,
        })
    }

    /// Reclaims every port in order, one at a time, appending each freed
    /// port to `freed`. Ports that were already free are left out. The first
    /// failure aborts the rest; whatever was freed before it stays recorded.
    pub async fn reclaim_all(
        &self,
        ports: impl IntoIterator<Item = u16>,
        freed: &mut Vec<ReclaimResult>,
    ) -> Result<(), ServerError> {
        for port in ports {
            let result = self.reclaim(port).await?;
            if result.freed {
                freed.push(result);
            }
        }
        Ok(())
    }
}
