pub mod config;
pub mod servers;

use axum::Json;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

pub(crate) type ApiError = (StatusCode, Json<Value>);

pub(crate) fn api_error(status: StatusCode, message: impl std::fmt::Display) -> ApiError {
    (
        status,
        Json(json!({ "ok": false, "error": message.to_string() })),
    )
}

/// `?id=` query or `{"id": ...}` body.
#[derive(Debug, Deserialize)]
pub struct IdParam {
    pub id: String,
}
