use crate::state::AppState;
use axum::{extract::State, http::StatusCode};
use log::error;

/// Names the service; useful as a reachability check behind a proxy
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is running", content_type = "text/plain", body = String)
    ),
    tag = "Health"
)]
pub async fn root() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Academic records portal API")
}

/// Liveness of the portal and its database pool
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Portal and database reachable", content_type = "text/plain", body = String),
        (status = 503, description = "Database unreachable", content_type = "text/plain", body = String)
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            error!("Database ping failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
        }
    }
}
