//! Port inspection: which processes currently hold a TCP port.

use crate::error::ServerError;
use listeners::{Listener, Protocol};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Live occupancy of one port, recomputed on every call and never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PortOccupancy {
    pub running: bool,
    pub pids: Vec<u32>,
}

impl PortOccupancy {
    pub fn free() -> Self {
        Self::default()
    }

    /// Builds an occupancy from raw PIDs, sorted and de-duplicated so a single
    /// probe always reports them in the same order.
    pub fn from_pids(pids: impl IntoIterator<Item = u32>) -> Self {
        let pids: Vec<u32> = pids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        Self {
            running: !pids.is_empty(),
            pids,
        }
    }
}

/// Queries the OS for the processes bound to a port.
///
/// "Nothing listening" is `Ok(PortOccupancy { running: false, .. })`; only a
/// failure to read the socket tables is an error.
pub trait PortInspector: Send + Sync {
    fn inspect(&self, port: u16) -> Result<PortOccupancy, ServerError>;
}

/// Inspector backed by the OS socket/process tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsPortInspector;

impl PortInspector for OsPortInspector {
    fn inspect(&self, port: u16) -> Result<PortOccupancy, ServerError> {
        let all = listeners::get_all().map_err(|e| ServerError::ProbeFailure {
            port,
            message: e.to_string(),
        })?;
        let occupancy = PortOccupancy::from_pids(tcp_pids_on_port(&all, port));
        trace!("port {port}: running={} pids={:?}", occupancy.running, occupancy.pids);
        Ok(occupancy)
    }
}

/// PIDs of the TCP sockets bound to `port`, any address family.
fn tcp_pids_on_port<'a>(
    all: impl IntoIterator<Item = &'a Listener>,
    port: u16,
) -> impl Iterator<Item = u32> {
    all.into_iter()
        .filter(move |l| l.protocol == Protocol::TCP && l.socket.port() == port)
        .map(|l| l.process.pid)
}

/// Runs a probe on the blocking pool; socket table scans walk /proc.
pub(crate) async fn inspect_async(
    inspector: &Arc<dyn PortInspector>,
    port: u16,
) -> Result<PortOccupancy, ServerError> {
    let inspector = inspector.clone();
    tokio::task::spawn_blocking(move || inspector.inspect(port))
        .await
        .map_err(|e| ServerError::ProbeFailure {
            port,
            message: e.to_string(),
        })?
}
