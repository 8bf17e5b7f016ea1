use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{ApiError, IdParam, api_error};
use crate::server_config::{RawServerConfig, ServerConfig};
use crate::supervisor::Supervisor;

/// A saved configuration as the API returns it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView {
    id: String,
    directory: PathBuf,
    command: String,
    port: Option<u16>,
    ports: IndexSet<u16>,
}

impl ConfigView {
    fn new(id: String, config: ServerConfig) -> Self {
        Self {
            id,
            port: config.primary_port(),
            directory: config.directory,
            command: config.command,
            ports: config.ports,
        }
    }
}

/// Body of `POST /api/config`; the port fields accept every form the store
/// accepts on disk.
#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    id: String,
    #[serde(flatten)]
    config: RawServerConfig,
}

pub async fn get(
    State(supervisor): State<&'static Supervisor>,
    Query(q): Query<IdParam>,
) -> Result<Json<ConfigView>, ApiError> {
    match supervisor.store().load(&q.id) {
        Ok(Some(config)) => Ok(Json(ConfigView::new(q.id, config))),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("no configuration saved for '{}'", q.id),
        )),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e)),
    }
}

pub async fn save(
    State(supervisor): State<&'static Supervisor>,
    Json(req): Json<SaveRequest>,
) -> Result<Json<ConfigView>, ApiError> {
    let config = req.config.normalize();
    if config.ports.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "at least one port between 1 and 65535 is required",
        ));
    }
    supervisor
        .store()
        .save(&req.id, &config)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    Ok(Json(ConfigView::new(req.id, config)))
}
