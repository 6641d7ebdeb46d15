use crate::{
    auth::AuthUser,
    dtos::{
        MessageResponse,
        department::{DepartmentListItem, DepartmentRequest, DepartmentResponse},
    },
    error::{ApiJson, AppError, AppResult},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
};
use database::{
    DatabaseConnection,
    services::{department::DepartmentService, user::UserService},
};
use log::info;
use models::role::Role;

fn validate(request: &DepartmentRequest) -> AppResult<()> {
    if request.name.trim().is_empty() || request.code.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Name and code are required".to_string(),
        ));
    }
    if !(0.0..=100.0).contains(&request.nba_threshold) {
        return Err(AppError::BadRequest(
            "NBA threshold must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

/// The referenced account must be an HOD, and a member of `department_id` when given
async fn check_hod(
    db: &DatabaseConnection,
    hod_id: Option<i32>,
    department_id: Option<i32>,
) -> AppResult<()> {
    let Some(hod_id) = hod_id else {
        return Ok(());
    };

    let account = UserService::find(db, hod_id)
        .await
        .map_err(AppError::db("Internal server error"))?
        .ok_or_else(|| AppError::BadRequest("HOD not found".to_string()))?;

    if account.role != Role::Hod {
        return Err(AppError::BadRequest(
            "Selected user is not an HOD".to_string(),
        ));
    }
    if department_id.is_some_and(|id| account.department_id != Some(id)) {
        return Err(AppError::BadRequest(
            "HOD must belong to this department".to_string(),
        ));
    }
    Ok(())
}

/// Every department with its HOD and head counts
#[utoipa::path(
    get,
    path = "/departments",
    responses(
        (status = 200, description = "Departments ordered by name", body = Vec<DepartmentListItem>),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Departments"
)]
pub async fn list_departments(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<Vec<DepartmentListItem>>> {
    let departments = DepartmentService::list(&state.db)
        .await
        .map_err(AppError::db("Internal server error"))?;

    Ok(Json(departments.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/departments",
    request_body = DepartmentRequest,
    responses(
        (status = 200, description = "Department created", body = DepartmentResponse),
        (status = 400, description = "Invalid department"),
        (status = 401, description = "Not an administrator"),
        (status = 500, description = "Failed to create department")
    ),
    security(("jwt" = [])),
    tag = "Departments"
)]
pub async fn create_department(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<DepartmentRequest>,
) -> AppResult<Json<DepartmentResponse>> {
    user.require_admin()?;
    validate(&request)?;
    check_hod(&state.db, request.hod_id, None).await?;

    let department = DepartmentService::create(&state.db, request.into())
        .await
        .map_err(AppError::db("Failed to create department"))?;

    info!("Created department {} ({})", department.id, department.code);
    Ok(Json(department.into()))
}

/// Administrators may update any department, an HOD only their own
#[utoipa::path(
    put,
    path = "/departments/{id}",
    params(("id" = i32, Path, description = "Department ID")),
    request_body = DepartmentRequest,
    responses(
        (status = 200, description = "Department updated", body = DepartmentResponse),
        (status = 400, description = "Invalid department or HOD"),
        (status = 401, description = "Not an administrator or HOD"),
        (status = 403, description = "Another department"),
        (status = 404, description = "Department not found"),
        (status = 500, description = "Failed to update department")
    ),
    security(("jwt" = [])),
    tag = "Departments"
)]
pub async fn update_department(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ApiJson(request): ApiJson<DepartmentRequest>,
) -> AppResult<Json<DepartmentResponse>> {
    user.require_staff()?;
    user.ensure_department(id, "Cannot update other departments")?;
    validate(&request)?;
    check_hod(&state.db, request.hod_id, Some(id)).await?;

    let department = DepartmentService::update(&state.db, id, request.into())
        .await
        .map_err(AppError::db("Failed to update department"))?
        .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;

    Ok(Json(department.into()))
}

/// Removes the department with its subjects, students and members
#[utoipa::path(
    delete,
    path = "/departments/{id}",
    params(("id" = i32, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department deleted", body = MessageResponse),
        (status = 401, description = "Not an administrator"),
        (status = 404, description = "Department not found"),
        (status = 500, description = "Failed to delete department")
    ),
    security(("jwt" = [])),
    tag = "Departments"
)]
pub async fn delete_department(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    user.require_admin()?;

    let deleted = DepartmentService::delete(&state.db, id)
        .await
        .map_err(AppError::db("Failed to delete department"))?;

    if !deleted {
        return Err(AppError::NotFound("Department not found".to_string()));
    }

    info!("Department {id} deleted by user {}", user.id());
    Ok(Json(MessageResponse::new("Department deleted successfully")))
}
