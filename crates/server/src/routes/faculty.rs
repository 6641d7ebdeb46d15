use crate::{
    auth::{AuthUser, password::hash_password},
    dtos::{
        MessageResponse,
        faculty::{
            AssignSubjectRequest, AssignmentResponse, CreateFacultyRequest, DeleteFacultyRequest,
            FacultyListItem, TaughtSubjectResponse, UpdateFacultyRequest,
        },
        user::AccountResponse,
    },
    error::{ApiJson, AppError, AppResult},
    state::AppState,
};
use axum::{Json, extract::State};
use database::{
    DatabaseConnection,
    entities::users,
    services::{
        faculty::FacultyService,
        subject::SubjectService,
        user::{NewUser, UserChanges, UserService},
    },
};
use log::{error, info};
use models::role::Role;

fn missing_fields() -> AppError {
    AppError::BadRequest("Missing required fields".to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn hash(password: &str) -> AppResult<String> {
    hash_password(password).map_err(|e| {
        error!("Failed to hash password: {e}");
        AppError::Internal("Failed to hash password".to_string())
    })
}

async fn existing(db: &DatabaseConnection, id: i32) -> AppResult<users::Model> {
    FacultyService::find(db, id)
        .await
        .map_err(AppError::db("Internal server error"))?
        .ok_or_else(|| AppError::NotFound("Faculty not found".to_string()))
}

/// Faculty accounts visible to the caller, ordered by name
#[utoipa::path(
    get,
    path = "/faculty",
    responses(
        (status = 200, description = "Faculty with their subject counts", body = Vec<FacultyListItem>),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Faculty"
)]
pub async fn list_faculty(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<FacultyListItem>>> {
    let faculty = FacultyService::list(&state.db, &user.scope())
        .await
        .map_err(AppError::db("Internal server error"))?;

    Ok(Json(faculty.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/faculty",
    request_body = CreateFacultyRequest,
    responses(
        (status = 200, description = "Faculty account created", body = AccountResponse),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "Not an administrator or HOD"),
        (status = 403, description = "Another department"),
        (status = 500, description = "Failed to create faculty")
    ),
    security(("jwt" = [])),
    tag = "Faculty"
)]
pub async fn create_faculty(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreateFacultyRequest>,
) -> AppResult<Json<AccountResponse>> {
    user.require_staff()?;

    let (Some(name), Some(email), Some(password), Some(department_id)) = (
        non_empty(request.name),
        non_empty(request.email),
        non_empty(request.password),
        request.department_id,
    ) else {
        return Err(missing_fields());
    };

    user.ensure_department(department_id, "Cannot add faculty to other departments")?;

    let account = UserService::create(
        &state.db,
        NewUser {
            name,
            email,
            password_hash: hash(&password)?,
            role: Role::Faculty,
            department_id: Some(department_id),
        },
    )
    .await
    .map_err(AppError::db("Failed to create faculty"))?;

    info!("Created faculty {} in department {department_id}", account.id);
    Ok(Json(account.into()))
}

/// Updates the faculty account named by the body's `id`
///
/// The password is re-hashed only when a new one is supplied.
#[utoipa::path(
    put,
    path = "/faculty",
    request_body = UpdateFacultyRequest,
    responses(
        (status = 200, description = "Faculty account updated", body = AccountResponse),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "Not an administrator or HOD"),
        (status = 403, description = "Another department"),
        (status = 404, description = "Faculty not found"),
        (status = 500, description = "Failed to update faculty")
    ),
    security(("jwt" = [])),
    tag = "Faculty"
)]
pub async fn update_faculty(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<UpdateFacultyRequest>,
) -> AppResult<Json<AccountResponse>> {
    user.require_staff()?;

    let (Some(id), Some(name), Some(email), Some(department_id)) = (
        request.id,
        non_empty(request.name),
        non_empty(request.email),
        request.department_id,
    ) else {
        return Err(missing_fields());
    };

    const FORBIDDEN: &str = "Cannot edit faculty from other departments";
    let faculty = existing(&state.db, id).await?;
    user.ensure_account_department(faculty.department_id, FORBIDDEN)?;
    user.ensure_department(department_id, FORBIDDEN)?;

    let password_hash = match non_empty(request.password) {
        Some(password) => Some(hash(&password)?),
        None => None,
    };

    let account = FacultyService::update(
        &state.db,
        id,
        UserChanges {
            name,
            email,
            role: Role::Faculty,
            department_id: Some(department_id),
            password_hash,
        },
    )
    .await
    .map_err(AppError::db("Failed to update faculty"))?
    .ok_or_else(|| AppError::NotFound("Faculty not found".to_string()))?;

    Ok(Json(account.into()))
}

/// Deletes the faculty account named by the body's `id` with its assignments
#[utoipa::path(
    delete,
    path = "/faculty",
    request_body = DeleteFacultyRequest,
    responses(
        (status = 200, description = "Faculty deleted", body = MessageResponse),
        (status = 400, description = "Missing faculty ID"),
        (status = 401, description = "Not an administrator or HOD"),
        (status = 403, description = "Another department"),
        (status = 404, description = "Faculty not found"),
        (status = 500, description = "Failed to delete faculty")
    ),
    security(("jwt" = [])),
    tag = "Faculty"
)]
pub async fn delete_faculty(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<DeleteFacultyRequest>,
) -> AppResult<Json<MessageResponse>> {
    user.require_staff()?;

    let Some(id) = request.id else {
        return Err(AppError::BadRequest("Missing faculty ID".to_string()));
    };

    let faculty = existing(&state.db, id).await?;
    user.ensure_account_department(
        faculty.department_id,
        "Cannot delete faculty from other departments",
    )?;

    let deleted = FacultyService::delete(&state.db, id)
        .await
        .map_err(AppError::db("Failed to delete faculty"))?;

    if !deleted {
        return Err(AppError::NotFound("Faculty not found".to_string()));
    }

    info!("Faculty {id} deleted by user {}", user.id());
    Ok(Json(MessageResponse::new("Faculty deleted successfully")))
}

/// Assigns a subject to a faculty member for one semester and batch
///
/// Assigning the same key again replaces its sections.
#[utoipa::path(
    post,
    path = "/faculty/assign-subject",
    request_body = AssignSubjectRequest,
    responses(
        (status = 200, description = "Stored assignment", body = AssignmentResponse),
        (status = 400, description = "No sections given"),
        (status = 401, description = "Not an administrator or HOD"),
        (status = 403, description = "Faculty or subject of another department"),
        (status = 404, description = "Faculty or subject not found"),
        (status = 500, description = "Failed to assign subject")
    ),
    security(("jwt" = [])),
    tag = "Faculty"
)]
pub async fn assign_subject(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<AssignSubjectRequest>,
) -> AppResult<Json<AssignmentResponse>> {
    user.require_staff()?;

    if request.sections.iter().all(|s| s.trim().is_empty()) {
        return Err(AppError::BadRequest(
            "At least one section is required".to_string(),
        ));
    }

    const FORBIDDEN: &str = "Cannot assign subjects outside your department";
    let faculty = existing(&state.db, request.faculty_id).await?;
    user.ensure_account_department(faculty.department_id, FORBIDDEN)?;

    let subject = SubjectService::find(&state.db, request.subject_id)
        .await
        .map_err(AppError::db("Internal server error"))?
        .ok_or_else(|| AppError::NotFound("Subject not found".to_string()))?;
    user.ensure_department(subject.department_id, FORBIDDEN)?;

    let assignment = FacultyService::assign(&state.db, request.into())
        .await
        .map_err(AppError::db("Failed to assign subject"))?;

    info!(
        "Faculty {} assigned subject {} sections {:?}",
        assignment.faculty_id, assignment.subject_id, assignment.sections
    );
    Ok(Json(assignment.into()))
}

/// Subjects the calling faculty member teaches
#[utoipa::path(
    get,
    path = "/faculty/my-subjects",
    responses(
        (status = 200, description = "Assigned subjects ordered by semester and name", body = Vec<TaughtSubjectResponse>),
        (status = 401, description = "Not a faculty member"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Faculty"
)]
pub async fn my_subjects(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<TaughtSubjectResponse>>> {
    user.require_faculty()?;

    let subjects = FacultyService::taught_subjects(&state.db, user.id())
        .await
        .map_err(AppError::db("Internal server error"))?;

    Ok(Json(subjects.into_iter().map(Into::into).collect()))
}
