use crate::Result;
use crate::supervisor::{SUPERVISOR, Supervisor};
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;

use super::routes;

/// The API routes, answering from `supervisor`.
pub fn router(supervisor: &'static Supervisor) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        // Servers
        .route("/api/servers", get(routes::servers::list))
        .route("/api/status", get(routes::servers::status))
        .route("/api/start", post(routes::servers::start))
        .route("/api/stop", post(routes::servers::stop))
        .route("/api/restart", post(routes::servers::restart))
        // Config
        .route(
            "/api/config",
            get(routes::config::get).post(routes::config::save),
        )
        .with_state(supervisor)
}

pub async fn serve(port: u16) -> Result<()> {
    let app = router(&SUPERVISOR);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| miette::miette!("Failed to bind web server to {}: {}", addr, e))?;

    info!("API listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| miette::miette!("Web server error: {}", e))?;

    Ok(())
}
