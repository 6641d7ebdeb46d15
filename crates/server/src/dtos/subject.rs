use chrono::NaiveDateTime;
use database::{
    entities::{subjects, units},
    services::subject::{SubjectInput, SubjectSummary, UnitInput},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct SubjectResponse {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub department_id: i32,
    pub semester: i32,
    pub credits: i32,
    pub created_at: NaiveDateTime,
}

impl From<subjects::Model> for SubjectResponse {
    fn from(subject: subjects::Model) -> Self {
        Self {
            id: subject.id,
            name: subject.name,
            code: subject.code,
            department_id: subject.department_id,
            semester: subject.semester,
            credits: subject.credits,
            created_at: subject.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubjectListItem {
    #[serde(flatten)]
    pub subject: SubjectResponse,
    pub department_name: Option<String>,
    /// Names of the assigned faculty, comma separated
    pub faculty_name: Option<String>,
}

impl From<SubjectSummary> for SubjectListItem {
    fn from(summary: SubjectSummary) -> Self {
        Self {
            subject: summary.subject.into(),
            department_name: summary.department_name,
            faculty_name: summary.faculty_name,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubjectRequest {
    pub name: String,
    pub code: String,
    pub department_id: i32,
    pub semester: i32,
    #[serde(default = "default_credits")]
    pub credits: i32,
}

fn default_credits() -> i32 {
    3
}

impl From<SubjectRequest> for SubjectInput {
    fn from(request: SubjectRequest) -> Self {
        Self {
            name: request.name,
            code: request.code,
            department_id: request.department_id,
            semester: request.semester,
            credits: request.credits,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnitResponse {
    pub id: i32,
    pub subject_id: i32,
    pub unit_number: i32,
    pub unit_name: String,
    pub max_mst_marks: i32,
    pub max_assignment_marks: i32,
}

impl From<units::Model> for UnitResponse {
    fn from(unit: units::Model) -> Self {
        Self {
            id: unit.id,
            subject_id: unit.subject_id,
            unit_number: unit.unit_number,
            unit_name: unit.unit_name,
            max_mst_marks: unit.max_mst_marks,
            max_assignment_marks: unit.max_assignment_marks,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubjectDetailsResponse {
    #[serde(flatten)]
    pub subject: SubjectResponse,
    pub department_name: Option<String>,
    pub units: Vec<UnitResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UnitRequest {
    pub unit_number: i32,
    pub unit_name: String,
    #[serde(default = "default_max_mst_marks")]
    pub max_mst_marks: i32,
    #[serde(default = "default_max_assignment_marks")]
    pub max_assignment_marks: i32,
}

fn default_max_mst_marks() -> i32 {
    24
}

fn default_max_assignment_marks() -> i32 {
    10
}

impl From<UnitRequest> for UnitInput {
    fn from(request: UnitRequest) -> Self {
        Self {
            unit_number: request.unit_number,
            unit_name: request.unit_name,
            max_mst_marks: request.max_mst_marks,
            max_assignment_marks: request.max_assignment_marks,
        }
    }
}

/// The complete unit set of a subject; units not listed are removed
#[derive(Debug, Deserialize, ToSchema)]
pub struct UnitsRequest {
    #[serde(default)]
    pub units: Option<Vec<UnitRequest>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnitsUpdatedResponse {
    pub message: String,
    pub units: Vec<UnitResponse>,
}
