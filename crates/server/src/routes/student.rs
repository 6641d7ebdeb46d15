use crate::{
    auth::AuthUser,
    dtos::{
        MessageResponse,
        marks::BatchReportResponse,
        student::{
            BulkUploadRequest, StudentListItem, StudentMarkResponse, StudentRequest,
            StudentResponse, SubjectMarksResponse, UpdateMarksRequest,
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
    entities::students,
    services::{
        department::DepartmentService,
        marks::{MarkEntry, MarkWriteError, MarksService},
        student::StudentService,
    },
};
use log::{info, warn};
use models::{
    batch::parse_rows,
    import::{SEMESTERS, StudentImportRow},
};

/// Error list cap of the bulk upload report
const MAX_UPLOAD_ERRORS: usize = 20;

fn validate(request: &StudentRequest) -> AppResult<()> {
    if request.roll_number.trim().is_empty() || request.name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Roll number and name are required".to_string(),
        ));
    }
    if !SEMESTERS.contains(&request.semester) {
        return Err(AppError::BadRequest(
            "Semester must be between 1 and 8".to_string(),
        ));
    }
    Ok(())
}

async fn existing(db: &DatabaseConnection, id: i32) -> AppResult<students::Model> {
    StudentService::find(db, id)
        .await
        .map_err(AppError::db("Internal server error"))?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))
}

/// Students visible to the caller, ordered by roll number
///
/// HODs and faculty only see their own department.
#[utoipa::path(
    get,
    path = "/students",
    responses(
        (status = 200, description = "Students", body = Vec<StudentListItem>),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Students"
)]
pub async fn list_students(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<StudentListItem>>> {
    let students = StudentService::list(&state.db, &user.scope())
        .await
        .map_err(AppError::db("Internal server error"))?;

    Ok(Json(
        students
            .into_iter()
            .map(|(student, department)| StudentListItem {
                student: student.into(),
                department_name: department.map(|d| d.name),
            })
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/students",
    request_body = StudentRequest,
    responses(
        (status = 200, description = "Student created", body = StudentResponse),
        (status = 400, description = "Invalid student"),
        (status = 401, description = "Not an administrator or HOD"),
        (status = 403, description = "Another department"),
        (status = 500, description = "Failed to create student")
    ),
    security(("jwt" = [])),
    tag = "Students"
)]
pub async fn create_student(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<StudentRequest>,
) -> AppResult<Json<StudentResponse>> {
    user.require_staff()?;
    user.ensure_department(
        request.department_id,
        "Cannot add student to other departments",
    )?;
    validate(&request)?;

    let student = StudentService::create(&state.db, request.into())
        .await
        .map_err(AppError::db("Failed to create student"))?;

    Ok(Json(student.into()))
}

/// Replaces every field of a student
///
/// An HOD may neither touch a student of another department nor move one
/// there.
#[utoipa::path(
    put,
    path = "/students/{id}",
    params(("id" = i32, Path, description = "Student ID")),
    request_body = StudentRequest,
    responses(
        (status = 200, description = "Student updated", body = StudentResponse),
        (status = 400, description = "Invalid student"),
        (status = 401, description = "Not an administrator or HOD"),
        (status = 403, description = "Another department"),
        (status = 404, description = "Student not found"),
        (status = 500, description = "Failed to update student")
    ),
    security(("jwt" = [])),
    tag = "Students"
)]
pub async fn update_student(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ApiJson(request): ApiJson<StudentRequest>,
) -> AppResult<Json<StudentResponse>> {
    user.require_staff()?;

    const FORBIDDEN: &str = "Cannot update student from other departments";
    let student = existing(&state.db, id).await?;
    user.ensure_department(student.department_id, FORBIDDEN)?;
    user.ensure_department(request.department_id, FORBIDDEN)?;
    validate(&request)?;

    let student = StudentService::update(&state.db, id, request.into())
        .await
        .map_err(AppError::db("Failed to update student"))?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

    Ok(Json(student.into()))
}

#[utoipa::path(
    delete,
    path = "/students/{id}",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student deleted", body = MessageResponse),
        (status = 401, description = "Not an administrator or HOD"),
        (status = 403, description = "Another department"),
        (status = 404, description = "Student not found"),
        (status = 500, description = "Failed to delete student")
    ),
    security(("jwt" = [])),
    tag = "Students"
)]
pub async fn delete_student(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    user.require_staff()?;

    let student = existing(&state.db, id).await?;
    user.ensure_department(
        student.department_id,
        "Cannot delete student from other departments",
    )?;

    let deleted = StudentService::delete(&state.db, id)
        .await
        .map_err(AppError::db("Failed to delete student"))?;

    if !deleted {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    Ok(Json(MessageResponse::new("Student deleted successfully")))
}

/// Subjects of the student's department and semester with marks per unit
#[utoipa::path(
    get,
    path = "/students/{id}/marks",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Marks by subject", body = Vec<SubjectMarksResponse>),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Another department"),
        (status = 404, description = "Student not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Students"
)]
pub async fn get_student_marks(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<SubjectMarksResponse>>> {
    let student = existing(&state.db, id).await?;
    user.ensure_department(
        student.department_id,
        "Cannot view students from other departments",
    )?;

    let overview = MarksService::student_overview(&state.db, &student)
        .await
        .map_err(AppError::db("Internal server error"))?;

    Ok(Json(overview.into_iter().map(Into::into).collect()))
}

/// Stores one unit's marks of a student
///
/// A component left out keeps its stored value.
#[utoipa::path(
    put,
    path = "/students/{id}/marks",
    params(("id" = i32, Path, description = "Student ID")),
    request_body = UpdateMarksRequest,
    responses(
        (status = 200, description = "Stored marks", body = StudentMarkResponse),
        (status = 400, description = "Marks out of range"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not allowed to enter marks for the unit"),
        (status = 404, description = "Student or unit not found"),
        (status = 500, description = "Failed to update marks")
    ),
    security(("jwt" = [])),
    tag = "Students"
)]
pub async fn update_student_marks(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ApiJson(request): ApiJson<UpdateMarksRequest>,
) -> AppResult<Json<StudentMarkResponse>> {
    let entry = MarkEntry {
        student_id: id,
        unit_id: request.unit_id,
        mst_marks: request.mst_marks,
        assignment_marks: request.assignment_marks,
    };

    let mark = MarksService::write(&state.db, &user.scope(), user.id(), entry)
        .await
        .map_err(|e| match e {
            MarkWriteError::UnitNotFound(_) | MarkWriteError::StudentNotFound(_) => {
                AppError::NotFound(e.to_string())
            }
            MarkWriteError::NoPermission(_) => AppError::Forbidden(e.to_string()),
            MarkWriteError::Invalid(_) => AppError::BadRequest(e.to_string()),
            MarkWriteError::Db(source) => AppError::db("Failed to update marks")(source),
        })?;

    Ok(Json(mark.into()))
}

/// Imports already-parsed spreadsheet rows, upserting on roll number
///
/// Rows fail independently; the report lists at most 20 errors.
#[utoipa::path(
    post,
    path = "/students/bulk-upload",
    request_body = BulkUploadRequest,
    responses(
        (status = 200, description = "Import report", body = BatchReportResponse),
        (status = 400, description = "Invalid student data"),
        (status = 401, description = "Not an administrator or HOD"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Students"
)]
pub async fn bulk_upload_students(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<BulkUploadRequest>,
) -> AppResult<Json<BatchReportResponse>> {
    user.require_staff()?;

    let Some(rows) = request.students else {
        return Err(AppError::BadRequest("Invalid student data".to_string()));
    };

    let directory = DepartmentService::directory(&state.db)
        .await
        .map_err(AppError::db("Internal server error"))?;
    if directory.is_empty() {
        warn!("No departments exist; every uploaded student will fail");
    }

    let rows = parse_rows::<StudentImportRow>(rows);
    let outcome = StudentService::import(&state.db, &user.principal, &directory, rows).await;
    info!(
        "Student upload by user {}: {} imported, {} failed",
        user.id(),
        outcome.successful(),
        outcome.failed()
    );

    Ok(Json(outcome.into_report(MAX_UPLOAD_ERRORS).into()))
}
