//! In-memory bookkeeping for the supervisor
//!
//! Launch records and per-server locks. Nothing here decides whether a server
//! is running; that always comes from probing its ports.

use super::Supervisor;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// What this supervisor last launched for a server.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRecord {
    pub pid: u32,
    pub started_at: chrono::DateTime<chrono::Local>,
    pub command: String,
    pub directory: PathBuf,
}

impl Supervisor {
    /// Record a launch, replacing any previous record for the server
    pub(crate) async fn record_launch(&self, id: &str, record: LaunchRecord) {
        debug!("recording launch of {id} as pid {}", record.pid);
        self.launches.lock().await.insert(id.to_string(), record);
    }

    /// Forget the launch record for a server, if any
    pub(crate) async fn forget_launch(&self, id: &str) {
        if self.launches.lock().await.remove(id).is_some() {
            debug!("dropped launch record for {id}");
        }
    }

    pub async fn launch_record(&self, id: &str) -> Option<LaunchRecord> {
        self.launches.lock().await.get(id).cloned()
    }

    /// Serialize start/stop/restart per server. Different servers never
    /// contend; status does not take this lock.
    pub(crate) async fn lock_server(&self, id: &str) -> ServerGuard<'_> {
        let lock = {
            let mut locks = self.server_locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        ServerGuard {
            supervisor: self,
            id: id.to_string(),
            _guard: lock.lock_owned().await,
        }
    }
}

/// Held for the duration of one operation on a server. The lock entry is
/// dropped from the map once nobody else holds or waits on it.
pub(crate) struct ServerGuard<'a> {
    supervisor: &'a Supervisor,
    id: String,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for ServerGuard<'_> {
    fn drop(&mut self) {
        let mut locks = self
            .supervisor
            .server_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        // one reference in the map, one in this guard
        if locks.get(&self.id).is_some_and(|l| Arc::strong_count(l) == 2) {
            locks.remove(&self.id);
        }
    }
}
