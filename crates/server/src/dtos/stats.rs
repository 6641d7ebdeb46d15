use database::services::stats::{AdminStats, FacultyStats, HodStats};
use models::analytics::{AnalyticsSummary, DepartmentPerformance, SemesterPerformance};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStatsResponse {
    pub departments: u64,
    pub faculty: u64,
    pub students: u64,
    pub subjects: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HodStatsResponse {
    pub department_faculty: u64,
    pub department_students: u64,
    pub department_subjects: u64,
    pub nba_threshold: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FacultyStatsResponse {
    pub assigned_subjects: u64,
    pub total_students: u64,
    /// Entered unit marks over expected unit marks, in percent
    pub marks_progress: f64,
}

/// Dashboard figures; the shape depends on the caller's role
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum DashboardStats {
    Admin(AdminStatsResponse),
    Hod(HodStatsResponse),
    Faculty(FacultyStatsResponse),
}

impl From<AdminStats> for DashboardStats {
    fn from(stats: AdminStats) -> Self {
        Self::Admin(AdminStatsResponse {
            departments: stats.departments,
            faculty: stats.faculty,
            students: stats.students,
            subjects: stats.subjects,
        })
    }
}

impl From<HodStats> for DashboardStats {
    fn from(stats: HodStats) -> Self {
        Self::Hod(HodStatsResponse {
            department_faculty: stats.department_faculty,
            department_students: stats.department_students,
            department_subjects: stats.department_subjects,
            nba_threshold: stats.nba_threshold,
        })
    }
}

impl From<FacultyStats> for DashboardStats {
    fn from(stats: FacultyStats) -> Self {
        Self::Faculty(FacultyStatsResponse {
            assigned_subjects: stats.assigned_subjects,
            total_students: stats.total_students,
            marks_progress: stats.marks_progress,
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AnalyticsQuery {
    /// Department id
    pub department: Option<i32>,
    pub semester: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPerformanceResponse {
    pub department_id: i32,
    pub name: String,
    pub students: usize,
    pub avg_marks: f64,
    pub nba_compliance: f64,
}

impl From<DepartmentPerformance> for DepartmentPerformanceResponse {
    fn from(row: DepartmentPerformance) -> Self {
        Self {
            department_id: row.department_id,
            name: row.name,
            students: row.students,
            avg_marks: row.avg_marks,
            nba_compliance: row.nba_compliance,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SemesterPerformanceResponse {
    pub semester: String,
    pub pass: f64,
    pub fail: f64,
}

impl From<SemesterPerformance> for SemesterPerformanceResponse {
    fn from(row: SemesterPerformance) -> Self {
        Self {
            semester: row.semester,
            pass: row.pass,
            fail: row.fail,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub overall_performance: f64,
    pub nba_compliance: f64,
    pub at_risk_students: usize,
    pub students_evaluated: usize,
    pub department_performance: Vec<DepartmentPerformanceResponse>,
    pub semester_wise_performance: Vec<SemesterPerformanceResponse>,
}

impl From<AnalyticsSummary> for AnalyticsResponse {
    fn from(summary: AnalyticsSummary) -> Self {
        Self {
            overall_performance: summary.overall_performance,
            nba_compliance: summary.nba_compliance,
            at_risk_students: summary.at_risk_students,
            students_evaluated: summary.students_evaluated,
            department_performance: summary
                .department_performance
                .into_iter()
                .map(Into::into)
                .collect(),
            semester_wise_performance: summary
                .semester_wise_performance
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}
