use crate::{
    auth::{AuthUser, password::hash_password},
    dtos::{
        MessageResponse,
        user::{AccountResponse, CreateUserRequest, UpdateUserRequest, UserResponse, UsersQuery},
    },
    error::{ApiJson, AppError, AppResult},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use database::services::user::{NewUser, UserChanges, UserService};
use log::{error, info};
use models::role::Role;

fn validate(name: &str, email: &str, role: Role, department_id: Option<i32>) -> AppResult<()> {
    if name.trim().is_empty() || email.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Name and email are required".to_string(),
        ));
    }
    if role != Role::Admin && department_id.is_none() {
        return Err(AppError::BadRequest(format!(
            "A {role} account needs a department"
        )));
    }
    Ok(())
}

fn hash(password: &str) -> AppResult<String> {
    hash_password(password).map_err(|e| {
        error!("Failed to hash password: {e}");
        AppError::Internal("Failed to hash password".to_string())
    })
}

/// All accounts, newest first
#[utoipa::path(
    get,
    path = "/users",
    params(UsersQuery),
    responses(
        (status = 200, description = "Accounts with their department names", body = Vec<UserResponse>),
        (status = 400, description = "Unknown role"),
        (status = 401, description = "Not an administrator"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UsersQuery>,
) -> AppResult<Json<Vec<UserResponse>>> {
    user.require_admin()?;

    let users = UserService::list(&state.db, query.role)
        .await
        .map_err(AppError::db("Internal server error"))?;

    Ok(Json(
        users
            .into_iter()
            .map(|(account, department)| UserResponse::new(account, department.map(|d| d.name)))
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Account created", body = AccountResponse),
        (status = 400, description = "Invalid account"),
        (status = 401, description = "Not an administrator"),
        (status = 500, description = "Failed to create user")
    ),
    security(("jwt" = [])),
    tag = "Users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> AppResult<Json<AccountResponse>> {
    user.require_admin()?;
    validate(&request.name, &request.email, request.role, request.department_id)?;
    if request.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".to_string()));
    }

    let account = UserService::create(
        &state.db,
        NewUser {
            password_hash: hash(&request.password)?,
            name: request.name,
            email: request.email,
            role: request.role,
            department_id: request.department_id,
        },
    )
    .await
    .map_err(AppError::db("Failed to create user"))?;

    info!("Created {} account {}", account.role, account.id);
    Ok(Json(account.into()))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = AccountResponse),
        (status = 400, description = "Invalid account"),
        (status = 401, description = "Not an administrator"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Failed to update user")
    ),
    security(("jwt" = [])),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> AppResult<Json<AccountResponse>> {
    user.require_admin()?;
    validate(&request.name, &request.email, request.role, request.department_id)?;

    let password_hash = match request.password.filter(|p| !p.is_empty()) {
        Some(password) => Some(hash(&password)?),
        None => None,
    };

    let account = UserService::update(
        &state.db,
        id,
        UserChanges {
            name: request.name,
            email: request.email,
            role: request.role,
            department_id: request.department_id,
            password_hash,
        },
    )
    .await
    .map_err(AppError::db("Failed to update user"))?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(account.into()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 400, description = "Own account"),
        (status = 401, description = "Not an administrator"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Failed to delete user")
    ),
    security(("jwt" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    user.require_admin()?;

    if id == user.id() {
        return Err(AppError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    let deleted = UserService::delete(&state.db, id)
        .await
        .map_err(AppError::db("Failed to delete user"))?;

    if !deleted {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    info!("User {id} deleted by user {}", user.id());
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
