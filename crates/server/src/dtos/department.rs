use chrono::NaiveDateTime;
use database::{
    entities::departments,
    services::department::{DepartmentInput, DepartmentSummary},
};
use models::analytics::DEFAULT_NBA_THRESHOLD;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct DepartmentResponse {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub hod_id: Option<i32>,
    pub nba_threshold: f64,
    pub created_at: NaiveDateTime,
}

impl From<departments::Model> for DepartmentResponse {
    fn from(department: departments::Model) -> Self {
        Self {
            id: department.id,
            name: department.name,
            code: department.code,
            hod_id: department.hod_id,
            nba_threshold: department.nba_threshold,
            created_at: department.created_at,
        }
    }
}

/// A department row with its HOD and head counts
#[derive(Debug, Serialize, ToSchema)]
pub struct DepartmentListItem {
    #[serde(flatten)]
    pub department: DepartmentResponse,
    pub hod_name: Option<String>,
    pub faculty_count: i64,
    pub student_count: i64,
}

impl From<DepartmentSummary> for DepartmentListItem {
    fn from(summary: DepartmentSummary) -> Self {
        Self {
            department: summary.department.into(),
            hod_name: summary.hod_name,
            faculty_count: summary.faculty_count,
            student_count: summary.student_count,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DepartmentRequest {
    pub name: String,
    pub code: String,
    pub hod_id: Option<i32>,
    #[serde(default = "default_nba_threshold")]
    pub nba_threshold: f64,
}

fn default_nba_threshold() -> f64 {
    DEFAULT_NBA_THRESHOLD
}

impl From<DepartmentRequest> for DepartmentInput {
    fn from(request: DepartmentRequest) -> Self {
        Self {
            name: request.name,
            code: request.code,
            hod_id: request.hod_id,
            nba_threshold: request.nba_threshold,
        }
    }
}
