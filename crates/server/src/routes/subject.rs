use crate::{
    auth::AuthUser,
    dtos::{
        MessageResponse,
        subject::{
            SubjectDetailsResponse, SubjectListItem, SubjectRequest, SubjectResponse,
            UnitsRequest, UnitsUpdatedResponse,
        },
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
    entities::subjects,
    services::subject::{SubjectService, UnitInput},
};
use log::info;
use models::import::SEMESTERS;
use std::collections::HashSet;

fn validate(request: &SubjectRequest) -> AppResult<()> {
    if request.name.trim().is_empty() || request.code.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Name and code are required".to_string(),
        ));
    }
    if !SEMESTERS.contains(&request.semester) {
        return Err(AppError::BadRequest(
            "Semester must be between 1 and 8".to_string(),
        ));
    }
    if request.credits < 0 {
        return Err(AppError::BadRequest(
            "Credits cannot be negative".to_string(),
        ));
    }
    Ok(())
}

fn validate_units(units: &[UnitInput]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for unit in units {
        if !seen.insert(unit.unit_number) {
            return Err(AppError::BadRequest(format!(
                "Duplicate unit number {}",
                unit.unit_number
            )));
        }
        if unit.unit_name.trim().is_empty() {
            return Err(AppError::BadRequest(format!(
                "Unit {} needs a name",
                unit.unit_number
            )));
        }
        if unit.max_mst_marks < 0 || unit.max_assignment_marks < 0 {
            return Err(AppError::BadRequest(format!(
                "Unit {} has a negative maximum",
                unit.unit_number
            )));
        }
    }
    Ok(())
}

async fn existing(db: &DatabaseConnection, id: i32) -> AppResult<subjects::Model> {
    SubjectService::find(db, id)
        .await
        .map_err(AppError::db("Internal server error"))?
        .ok_or_else(|| AppError::NotFound("Subject not found".to_string()))
}

/// Subjects visible to the caller
///
/// Administrators see all subjects, HODs their department's and faculty the
/// ones assigned to them.
#[utoipa::path(
    get,
    path = "/subjects",
    responses(
        (status = 200, description = "Subjects ordered by department, semester and name", body = Vec<SubjectListItem>),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Subjects"
)]
pub async fn list_subjects(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<SubjectListItem>>> {
    let subjects = SubjectService::list(&state.db, &user.scope())
        .await
        .map_err(AppError::db("Internal server error"))?;

    Ok(Json(subjects.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/subjects",
    request_body = SubjectRequest,
    responses(
        (status = 200, description = "Subject created", body = SubjectResponse),
        (status = 400, description = "Invalid subject"),
        (status = 401, description = "Not an administrator or HOD"),
        (status = 403, description = "Another department"),
        (status = 500, description = "Failed to create subject")
    ),
    security(("jwt" = [])),
    tag = "Subjects"
)]
pub async fn create_subject(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<SubjectRequest>,
) -> AppResult<Json<SubjectResponse>> {
    user.require_staff()?;
    user.ensure_department(
        request.department_id,
        "Cannot add subject to other departments",
    )?;
    validate(&request)?;

    let subject = SubjectService::create(&state.db, request.into())
        .await
        .map_err(AppError::db("Failed to create subject"))?;

    Ok(Json(subject.into()))
}

#[utoipa::path(
    put,
    path = "/subjects/{id}",
    params(("id" = i32, Path, description = "Subject ID")),
    request_body = SubjectRequest,
    responses(
        (status = 200, description = "Subject updated", body = SubjectResponse),
        (status = 400, description = "Invalid subject"),
        (status = 401, description = "Not an administrator or HOD"),
        (status = 403, description = "Another department"),
        (status = 404, description = "Subject not found"),
        (status = 500, description = "Failed to update subject")
    ),
    security(("jwt" = [])),
    tag = "Subjects"
)]
pub async fn update_subject(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ApiJson(request): ApiJson<SubjectRequest>,
) -> AppResult<Json<SubjectResponse>> {
    user.require_staff()?;

    const FORBIDDEN: &str = "Cannot update subject in other departments";
    let subject = existing(&state.db, id).await?;
    user.ensure_department(subject.department_id, FORBIDDEN)?;
    user.ensure_department(request.department_id, FORBIDDEN)?;
    validate(&request)?;

    let subject = SubjectService::update(&state.db, id, request.into())
        .await
        .map_err(AppError::db("Failed to update subject"))?
        .ok_or_else(|| AppError::NotFound("Subject not found".to_string()))?;

    Ok(Json(subject.into()))
}

/// Removes the subject after its assignments, marks and units
#[utoipa::path(
    delete,
    path = "/subjects/{id}",
    params(("id" = i32, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject deleted", body = MessageResponse),
        (status = 401, description = "Not an administrator or HOD"),
        (status = 403, description = "Another department"),
        (status = 404, description = "Subject not found"),
        (status = 500, description = "Failed to delete subject")
    ),
    security(("jwt" = [])),
    tag = "Subjects"
)]
pub async fn delete_subject(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    user.require_staff()?;

    let subject = existing(&state.db, id).await?;
    user.ensure_department(
        subject.department_id,
        "Cannot delete subject in other departments",
    )?;

    let deleted = SubjectService::delete(&state.db, id)
        .await
        .map_err(AppError::db("Failed to delete subject"))?;

    if !deleted {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    info!("Subject {id} deleted by user {}", user.id());
    Ok(Json(MessageResponse::new("Subject deleted successfully")))
}

/// The subject with its department name and units ordered by number
#[utoipa::path(
    get,
    path = "/subjects/{id}/details",
    params(("id" = i32, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject details", body = SubjectDetailsResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Subject not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Subjects"
)]
pub async fn get_subject_details(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<SubjectDetailsResponse>> {
    let (subject, department, units) = SubjectService::details(&state.db, id)
        .await
        .map_err(AppError::db("Internal server error"))?
        .ok_or_else(|| AppError::NotFound("Subject not found".to_string()))?;

    Ok(Json(SubjectDetailsResponse {
        subject: subject.into(),
        department_name: department.map(|d| d.name),
        units: units.into_iter().map(Into::into).collect(),
    }))
}

/// Replaces the unit set of a subject
///
/// Units whose number is not listed are removed together with their marks.
/// Listed units are created or updated in place, so marks of kept units
/// survive.
#[utoipa::path(
    put,
    path = "/subjects/{id}/details",
    params(("id" = i32, Path, description = "Subject ID")),
    request_body = UnitsRequest,
    responses(
        (status = 200, description = "Units updated", body = UnitsUpdatedResponse),
        (status = 400, description = "Invalid units data"),
        (status = 401, description = "Not an administrator or HOD"),
        (status = 403, description = "Another department"),
        (status = 404, description = "Subject not found"),
        (status = 500, description = "Failed to update units")
    ),
    security(("jwt" = [])),
    tag = "Subjects"
)]
pub async fn update_subject_units(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ApiJson(request): ApiJson<UnitsRequest>,
) -> AppResult<Json<UnitsUpdatedResponse>> {
    user.require_staff()?;

    let Some(units) = request.units else {
        return Err(AppError::BadRequest("Invalid units data".to_string()));
    };
    let units: Vec<UnitInput> = units.into_iter().map(Into::into).collect();
    validate_units(&units)?;

    let subject = existing(&state.db, id).await?;
    user.ensure_department(
        subject.department_id,
        "Cannot update subject in other departments",
    )?;

    let units = SubjectService::replace_units(&state.db, id, units)
        .await
        .map_err(AppError::db("Failed to update units"))?;

    info!("Subject {id} now has {} units", units.len());
    Ok(Json(UnitsUpdatedResponse {
        message: "Units updated successfully".to_string(),
        units: units.into_iter().map(Into::into).collect(),
    }))
}
