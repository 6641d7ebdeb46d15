use chrono::NaiveDateTime;
use database::{
    entities::faculty_subjects,
    services::faculty::{Assignment, FacultySummary, TaughtSubject},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct FacultyListItem {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub department_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub department_name: Option<String>,
    pub subject_count: i64,
}

impl From<FacultySummary> for FacultyListItem {
    fn from(summary: FacultySummary) -> Self {
        Self {
            id: summary.user.id,
            name: summary.user.name,
            email: summary.user.email,
            department_id: summary.user.department_id,
            created_at: summary.user.created_at,
            department_name: summary.department_name,
            subject_count: summary.subject_count,
        }
    }
}

// Fields are optional so that a missing one is reported as a missing field
// rather than a body rejection.

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateFacultyRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub department_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateFacultyRequest {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Replaced only when non-empty
    pub password: Option<String>,
    pub department_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct DeleteFacultyRequest {
    pub id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignSubjectRequest {
    pub faculty_id: i32,
    pub subject_id: i32,
    pub semester: i32,
    pub batch_year: i32,
    #[serde(default)]
    pub sections: Vec<String>,
}

impl From<AssignSubjectRequest> for Assignment {
    fn from(request: AssignSubjectRequest) -> Self {
        Self {
            faculty_id: request.faculty_id,
            subject_id: request.subject_id,
            semester: request.semester,
            batch_year: request.batch_year,
            sections: request.sections,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentResponse {
    pub id: i32,
    pub faculty_id: i32,
    pub subject_id: i32,
    pub semester: i32,
    pub batch_year: i32,
    pub sections: Vec<String>,
    pub created_at: NaiveDateTime,
}

impl From<faculty_subjects::Model> for AssignmentResponse {
    fn from(assignment: faculty_subjects::Model) -> Self {
        Self {
            id: assignment.id,
            faculty_id: assignment.faculty_id,
            subject_id: assignment.subject_id,
            semester: assignment.semester,
            batch_year: assignment.batch_year,
            sections: assignment.sections,
            created_at: assignment.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaughtSubjectResponse {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub semester: i32,
    pub credits: i32,
    pub sections: Vec<String>,
    pub batch_year: i32,
    pub department_name: Option<String>,
}

impl From<TaughtSubject> for TaughtSubjectResponse {
    fn from(taught: TaughtSubject) -> Self {
        Self {
            id: taught.subject.id,
            name: taught.subject.name,
            code: taught.subject.code,
            semester: taught.subject.semester,
            credits: taught.subject.credits,
            sections: taught.sections,
            batch_year: taught.batch_year,
            department_name: taught.department_name,
        }
    }
}
