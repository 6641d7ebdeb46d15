use crate::{auth::AuthUser, dtos::settings::SettingsResponse, state::AppState};
use axum::{Json, extract::State};

/// Institute settings from the server configuration
#[utoipa::path(
    get,
    path = "/settings",
    responses(
        (status = 200, description = "Institute settings", body = SettingsResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("jwt" = [])),
    tag = "Settings"
)]
pub async fn settings(State(state): State<AppState>, _user: AuthUser) -> Json<SettingsResponse> {
    Json(state.institute.as_ref().into())
}
