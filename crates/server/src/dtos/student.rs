use chrono::NaiveDateTime;
use database::{
    entities::{student_marks, students},
    services::{
        marks::{SubjectMarks, UnitMarks},
        student::StudentInput,
    },
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentResponse {
    pub id: i32,
    pub roll_number: String,
    pub name: String,
    pub department_id: i32,
    pub semester: i32,
    pub section: String,
    pub batch_year: i32,
    pub created_at: NaiveDateTime,
}

impl From<students::Model> for StudentResponse {
    fn from(student: students::Model) -> Self {
        Self {
            id: student.id,
            roll_number: student.roll_number,
            name: student.name,
            department_id: student.department_id,
            semester: student.semester,
            section: student.section,
            batch_year: student.batch_year,
            created_at: student.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentListItem {
    #[serde(flatten)]
    pub student: StudentResponse,
    pub department_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StudentRequest {
    pub roll_number: String,
    pub name: String,
    pub department_id: i32,
    pub semester: i32,
    #[serde(default = "default_section")]
    pub section: String,
    pub batch_year: i32,
}

fn default_section() -> String {
    "A".to_string()
}

impl From<StudentRequest> for StudentInput {
    fn from(request: StudentRequest) -> Self {
        Self {
            roll_number: request.roll_number,
            name: request.name,
            department_id: request.department_id,
            semester: request.semester,
            section: request.section,
            batch_year: request.batch_year,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkUploadRequest {
    /// Rows of `{roll_number, name, department, semester, section, batch_year}`
    ///
    /// Each row is read on its own; an unreadable row is reported as failed.
    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub students: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnitMarksResponse {
    pub id: i32,
    pub unit_number: i32,
    pub unit_name: String,
    pub max_mst_marks: i32,
    pub max_assignment_marks: i32,
    pub mst_marks: Option<f64>,
    pub assignment_marks: Option<f64>,
}

impl From<UnitMarks> for UnitMarksResponse {
    fn from(marks: UnitMarks) -> Self {
        Self {
            id: marks.unit.id,
            unit_number: marks.unit.unit_number,
            unit_name: marks.unit.unit_name,
            max_mst_marks: marks.unit.max_mst_marks,
            max_assignment_marks: marks.unit.max_assignment_marks,
            mst_marks: marks.mst_marks,
            assignment_marks: marks.assignment_marks,
        }
    }
}

/// One subject of a student's semester with their marks per unit
#[derive(Debug, Serialize, ToSchema)]
pub struct SubjectMarksResponse {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub credits: i32,
    pub faculty_name: Option<String>,
    pub units: Vec<UnitMarksResponse>,
}

impl From<SubjectMarks> for SubjectMarksResponse {
    fn from(marks: SubjectMarks) -> Self {
        Self {
            id: marks.subject.id,
            name: marks.subject.name,
            code: marks.subject.code,
            credits: marks.subject.credits,
            faculty_name: marks.faculty_name,
            units: marks.units.into_iter().map(Into::into).collect(),
        }
    }
}

/// Absent marks keep what is stored
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMarksRequest {
    pub unit_id: i32,
    #[serde(default)]
    pub mst_marks: Option<f64>,
    #[serde(default)]
    pub assignment_marks: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentMarkResponse {
    pub id: i32,
    pub student_id: i32,
    pub unit_id: i32,
    pub mst_marks: Option<f64>,
    pub assignment_marks: Option<f64>,
    pub faculty_id: Option<i32>,
    pub updated_at: NaiveDateTime,
}

impl From<student_marks::Model> for StudentMarkResponse {
    fn from(mark: student_marks::Model) -> Self {
        Self {
            id: mark.id,
            student_id: mark.student_id,
            unit_id: mark.unit_id,
            mst_marks: mark.mst_marks,
            assignment_marks: mark.assignment_marks,
            faculty_id: mark.faculty_id,
            updated_at: mark.updated_at,
        }
    }
}
