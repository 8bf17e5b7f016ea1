//! Structured results of the four server operations.
//!
//! These are what the CLI prints and the web layer serializes; no operation
//! lets an error escape past them.

use super::state::LaunchRecord;
use crate::error::ServerError;
use crate::reclaim::ReclaimResult;
use crate::server_status::ServerStatus;
use itertools::Itertools;
use serde::Serialize;

/// A port together with the processes that held it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortPids {
    pub port: u16,
    pub pids: Vec<u32>,
}

impl From<ReclaimResult> for PortPids {
    fn from(r: ReclaimResult) -> Self {
        Self {
            port: r.port,
            pids: r.pids,
        }
    }
}

impl std::fmt::Display for PortPids {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "port {} (pid {})", self.port, self.pids.iter().join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortDetail {
    pub port: u16,
    pub running: bool,
    pub pids: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub id: String,
    pub status: ServerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub per_port_detail: Vec<PortDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// What this supervisor last launched; informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch: Option<LaunchRecord>,
}

impl StatusReport {
    pub(crate) fn unconfigured(id: &str) -> Self {
        Self {
            id: id.to_string(),
            status: ServerStatus::Unconfigured,
            primary_port: None,
            pid: None,
            per_port_detail: vec![],
            error_message: None,
            launch: None,
        }
    }

    pub(crate) fn unknown(id: &str, primary_port: Option<u16>, error: String) -> Self {
        Self {
            status: ServerStatus::Unknown,
            primary_port,
            error_message: Some(error),
            ..Self::unconfigured(id)
        }
    }

    pub(crate) fn observed(
        id: &str,
        configured_primary: Option<u16>,
        detail: Vec<PortDetail>,
        launch: Option<LaunchRecord>,
    ) -> Self {
        let busy = detail.iter().find(|d| d.running);
        let (status, primary_port, pid) = match busy {
            Some(d) => (ServerStatus::Running, Some(d.port), d.pids.first().copied()),
            None => (ServerStatus::Stopped, configured_primary, None),
        };
        Self {
            id: id.to_string(),
            status,
            primary_port,
            pid,
            per_port_detail: detail,
            error_message: None,
            launch,
        }
    }
}

/// Which verb a launch reports with; the mechanics are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LaunchMode {
    Start,
    Restart,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOutcome {
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub replaced_ports: Vec<PortPids>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl StartOutcome {
    pub(crate) fn launched(
        mode: LaunchMode,
        id: &str,
        pid: u32,
        port: u16,
        replaced: Vec<PortPids>,
    ) -> Self {
        let verb = match mode {
            LaunchMode::Restart if !replaced.is_empty() => "Restarted",
            _ => "Started",
        };
        let mut message = format!("{verb} {id} on port {port} (pid {pid})");
        if !replaced.is_empty() {
            message.push_str(&format!(
                "; replaced {}",
                replaced.iter().map(|r| r.to_string()).join(", ")
            ));
        }
        Self {
            ok: true,
            message,
            pid: Some(pid),
            port: Some(port),
            replaced_ports: replaced,
            error_message: None,
            error_kind: None,
        }
    }

    /// `replaced` lists ports already reclaimed before the failure; those
    /// processes are gone even though nothing was launched.
    pub(crate) fn failed(
        mode: LaunchMode,
        id: &str,
        err: &miette::Report,
        replaced: Vec<PortPids>,
    ) -> Self {
        let verb = match mode {
            LaunchMode::Start => "start",
            LaunchMode::Restart => "restart",
        };
        let mut message = format!("Failed to {verb} {id}: {err}");
        if !replaced.is_empty() {
            message.push_str(&format!(
                "; already replaced {}",
                replaced.iter().map(|r| r.to_string()).join(", ")
            ));
        }
        Self {
            ok: false,
            message,
            pid: None,
            port: None,
            replaced_ports: replaced,
            error_message: Some(err.to_string()),
            error_kind: error_kind(err),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopOutcome {
    pub ok: bool,
    pub message: String,
    pub stopped_ports: Vec<PortPids>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl StopOutcome {
    pub(crate) fn stopped(id: &str, stopped: Vec<PortPids>) -> Self {
        Self {
            ok: true,
            message: format!(
                "Stopped {id}: {}",
                stopped.iter().map(|s| s.to_string()).join(", ")
            ),
            stopped_ports: stopped,
            error_message: None,
            error_kind: None,
        }
    }

    pub(crate) fn failed(id: &str, stopped: Vec<PortPids>, err: &miette::Report) -> Self {
        let message = match err.downcast_ref::<ServerError>() {
            Some(ServerError::NotRunning { .. }) => format!("{id} is not running"),
            _ => format!("Failed to stop {id}: {err}"),
        };
        Self {
            ok: false,
            message,
            stopped_ports: stopped,
            error_message: Some(err.to_string()),
            error_kind: error_kind(err),
        }
    }
}

fn error_kind(err: &miette::Report) -> Option<String> {
    err.downcast_ref::<ServerError>()
        .map(|e| e.kind().to_string())
}
