use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use super::{ApiError, IdParam, api_error};
use crate::supervisor::{StartOutcome, StatusReport, StopOutcome, Supervisor};

pub async fn list(
    State(supervisor): State<&'static Supervisor>,
) -> Result<Json<Vec<StatusReport>>, ApiError> {
    supervisor
        .list()
        .await
        .map(Json)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))
}

/// Always 200; a failed probe shows up as an `unknown` status.
pub async fn status(
    State(supervisor): State<&'static Supervisor>,
    Query(q): Query<IdParam>,
) -> Json<StatusReport> {
    Json(supervisor.status(&q.id).await)
}

pub async fn start(
    State(supervisor): State<&'static Supervisor>,
    Json(body): Json<IdParam>,
) -> Json<StartOutcome> {
    Json(supervisor.start(&body.id).await)
}

pub async fn stop(
    State(supervisor): State<&'static Supervisor>,
    Json(body): Json<IdParam>,
) -> Json<StopOutcome> {
    Json(supervisor.stop(&body.id).await)
}

pub async fn restart(
    State(supervisor): State<&'static Supervisor>,
    Json(body): Json<IdParam>,
) -> Json<StartOutcome> {
    Json(supervisor.restart(&body.id).await)
}
