use crate::{
    auth::AuthUser,
    dtos::marks::{BatchReportResponse, BulkSaveRequest, MarkRecord, RosterQuery, RosterResponse},
    error::{ApiJson, AppError, AppResult},
    state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
};
use database::services::{
    faculty::FacultyService,
    marks::{MarkEntry, MarksService},
    subject::SubjectService,
};
use log::info;
use models::{
    batch::{BatchRow, parse_rows},
    role::Role,
};

/// Error list cap of the bulk save report
const MAX_SAVE_ERRORS: usize = 10;

/// Students of a subject's class with their marks in one unit
///
/// The class is the subject's department and semester. Faculty only see the
/// sections they are assigned for the subject.
#[utoipa::path(
    get,
    path = "/marks/students",
    params(RosterQuery),
    responses(
        (status = 200, description = "Roster ordered by roll number", body = RosterResponse),
        (status = 400, description = "Subject ID is required"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Subject not assigned or of another department"),
        (status = 404, description = "Subject not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Marks"
)]
pub async fn roster(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RosterQuery>,
) -> AppResult<Json<RosterResponse>> {
    let Some(subject_id) = query.subject_id else {
        return Err(AppError::BadRequest("Subject ID is required".to_string()));
    };

    let subject = SubjectService::find(&state.db, subject_id)
        .await
        .map_err(AppError::db("Internal server error"))?
        .ok_or_else(|| AppError::NotFound("Subject not found".to_string()))?;

    let sections = match user.principal.role {
        Role::Admin => None,
        Role::Hod => {
            user.ensure_department(
                subject.department_id,
                "Cannot view subjects from other departments",
            )?;
            None
        }
        Role::Faculty => {
            let sections = FacultyService::sections(&state.db, user.id(), subject_id)
                .await
                .map_err(AppError::db("Internal server error"))?;
            if sections.is_empty() {
                return Err(AppError::Forbidden(
                    "Not assigned to this subject".to_string(),
                ));
            }
            Some(sections)
        }
    };

    let students = MarksService::roster(&state.db, &subject, query.unit_id, sections)
        .await
        .map_err(AppError::db("Internal server error"))?;

    Ok(Json(RosterResponse {
        total: students.len(),
        students: students.into_iter().map(Into::into).collect(),
    }))
}

/// Saves many marks, each on its own
///
/// A row the caller may not write, or whose marks are out of range, is
/// reported and skipped. Absent components keep their stored value.
#[utoipa::path(
    post,
    path = "/marks/bulk-save",
    request_body = BulkSaveRequest,
    responses(
        (status = 200, description = "Save report", body = BatchReportResponse),
        (status = 400, description = "Invalid marks data"),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Marks"
)]
pub async fn bulk_save(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<BulkSaveRequest>,
) -> AppResult<Json<BatchReportResponse>> {
    let Some(marks) = request.marks else {
        return Err(AppError::BadRequest("Invalid marks data".to_string()));
    };

    let entries: Vec<BatchRow<MarkEntry>> = parse_rows::<MarkRecord>(marks)
        .into_iter()
        .map(|row| row.map(MarkEntry::from))
        .collect();
    let outcome = MarksService::bulk_save(&state.db, &user.scope(), user.id(), entries).await;
    info!(
        "Mark save by user {}: {} saved, {} failed",
        user.id(),
        outcome.successful(),
        outcome.failed()
    );

    Ok(Json(outcome.into_report(MAX_SAVE_ERRORS).into()))
}
