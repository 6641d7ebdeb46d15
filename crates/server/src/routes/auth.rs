use crate::{
    auth::{
        AuthUser,
        password::verify_password,
        token::TokenPayload,
    },
    dtos::{
        auth::{LoginRequest, LoginResponse},
        user::UserResponse,
    },
    error::{ApiJson, AppError, AppResult},
    state::AppState,
};
use axum::{Json, extract::State};
use database::services::{department::DepartmentService, user::UserService};
use log::{error, info};

/// Exchanges credentials for a session token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let email = request.email.filter(|e| !e.trim().is_empty());
    let password = request.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };

    let user = UserService::find_by_email(&state.db, email.trim())
        .await
        .map_err(AppError::db("Internal server error"))?
        .filter(|user| verify_password(&password, &user.password_hash))
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let token = state
        .tokens
        .issue(&TokenPayload {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            department_id: user.department_id,
        })
        .map_err(|e| {
            error!("Failed to sign token for user {}: {e}", user.id);
            AppError::Internal("Internal server error".to_string())
        })?;

    let department_name = DepartmentService::name_of(&state.db, user.department_id)
        .await
        .map_err(AppError::db("Internal server error"))?;

    info!("User {} logged in as {}", user.id, user.role);

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::new(user, department_name),
    }))
}

/// Profile of the token holder
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Authentication"
)]
pub async fn me(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<UserResponse>> {
    let account = UserService::find(&state.db, user.id())
        .await
        .map_err(AppError::db("Internal server error"))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let department_name = DepartmentService::name_of(&state.db, account.department_id)
        .await
        .map_err(AppError::db("Internal server error"))?;

    Ok(Json(UserResponse::new(account, department_name)))
}
