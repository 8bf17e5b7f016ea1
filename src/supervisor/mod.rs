//! Supervisor module - port-based process reconciliation
//!
//! This module is split into focused submodules:
//! - `status`: liveness queries
//! - `lifecycle`: start/stop/restart
//! - `state`: launch records and per-server locks
//! - `outcome`: structured results returned to callers

mod lifecycle;
mod outcome;
mod state;
mod status;


use crate::env;
use crate::launcher::{DetachedLauncher, Launcher};
use crate::ports::{OsPortInspector, PortInspector};
use crate::procs::{OsTerminator, ProcessTerminator};
use crate::reclaim::PortReclaimer;
use crate::server_config::ServerStore;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub use outcome::{PortDetail, PortPids, StartOutcome, StatusReport, StopOutcome};
pub use state::LaunchRecord;

/// The OS-facing pieces the supervisor drives.
#[derive(Clone)]
pub struct Backends {
    pub inspector: Arc<dyn PortInspector>,
    pub terminator: Arc<dyn ProcessTerminator>,
    pub launcher: Arc<dyn Launcher>,
}

impl Default for Backends {
    fn default() -> Self {
        Self {
            inspector: Arc::new(OsPortInspector),
            terminator: Arc::new(OsTerminator),
            launcher: Arc::new(DetachedLauncher::default()),
        }
    }
}

pub struct Supervisor {
    pub(crate) store: ServerStore,
    pub(crate) inspector: Arc<dyn PortInspector>,
    pub(crate) terminator: Arc<dyn ProcessTerminator>,
    pub(crate) launcher: Arc<dyn Launcher>,
    pub(crate) reclaimer: PortReclaimer,
    pub(crate) settle_delay: Duration,
    /// Map of server ID to what this process last launched for it
    pub(crate) launches: Mutex<HashMap<String, LaunchRecord>>,
    pub(crate) server_locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

pub static SUPERVISOR: Lazy<Supervisor> =
    Lazy::new(|| Supervisor::new(ServerStore::default_store()));

impl Supervisor {
    /// A supervisor driving real processes, with the configured settle delay.
    pub fn new(store: ServerStore) -> Self {
        Self::with_backends(store, Backends::default(), *env::PORTWARDEN_SETTLE_DELAY)
    }

    pub fn with_backends(store: ServerStore, backends: Backends, settle_delay: Duration) -> Self {
        let reclaimer = PortReclaimer::new(
            backends.inspector.clone(),
            backends.terminator.clone(),
            settle_delay,
        );
        Self {
            store,
            inspector: backends.inspector,
            terminator: backends.terminator,
            launcher: backends.launcher,
            reclaimer,
            settle_delay,
            launches: Mutex::new(HashMap::new()),
            server_locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &ServerStore {
        &self.store
    }
}
