use database::services::marks::{MarkEntry, RosterEntry};
use models::batch::BatchReport;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct RosterQuery {
    pub subject_id: Option<i32>,
    /// Marks are reported for this unit; without it every mark is empty
    pub unit_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RosterStudent {
    pub id: i32,
    pub roll_number: String,
    pub name: String,
    pub section: String,
    pub mst_marks: Option<f64>,
    pub assignment_marks: Option<f64>,
}

impl From<RosterEntry> for RosterStudent {
    fn from(entry: RosterEntry) -> Self {
        Self {
            id: entry.student.id,
            roll_number: entry.student.roll_number,
            name: entry.student.name,
            section: entry.student.section,
            mst_marks: entry.mst_marks,
            assignment_marks: entry.assignment_marks,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RosterResponse {
    pub students: Vec<RosterStudent>,
    pub total: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkRecord {
    pub student_id: i32,
    pub unit_id: i32,
    #[serde(default)]
    pub mst_marks: Option<f64>,
    #[serde(default)]
    pub assignment_marks: Option<f64>,
}

impl From<MarkRecord> for MarkEntry {
    fn from(record: MarkRecord) -> Self {
        Self {
            student_id: record.student_id,
            unit_id: record.unit_id,
            mst_marks: record.mst_marks,
            assignment_marks: record.assignment_marks,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkSaveRequest {
    /// Each record is read on its own; an unreadable record is reported as failed
    #[serde(default)]
    #[schema(value_type = Option<Vec<MarkRecord>>)]
    pub marks: Option<Vec<serde_json::Value>>,
}

/// Outcome of a batch write; `errors` is capped per endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchReportResponse {
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl From<BatchReport> for BatchReportResponse {
    fn from(report: BatchReport) -> Self {
        Self {
            successful: report.successful,
            failed: report.failed,
            errors: report.errors,
        }
    }
}
