use crate::{
    dtos::{
        MessageResponse,
        auth::{LoginRequest, LoginResponse},
        department::{DepartmentListItem, DepartmentRequest, DepartmentResponse},
        faculty::{
            AssignSubjectRequest, AssignmentResponse, CreateFacultyRequest, DeleteFacultyRequest,
            FacultyListItem, TaughtSubjectResponse, UpdateFacultyRequest,
        },
        marks::{BatchReportResponse, BulkSaveRequest, MarkRecord, RosterResponse, RosterStudent},
        settings::SettingsResponse,
        stats::{
            AdminStatsResponse, AnalyticsResponse, DashboardStats, DepartmentPerformanceResponse,
            FacultyStatsResponse, HodStatsResponse, SemesterPerformanceResponse,
        },
        student::{
            BulkUploadRequest, StudentListItem, StudentMarkResponse, StudentRequest,
            StudentResponse, SubjectMarksResponse, UnitMarksResponse, UpdateMarksRequest,
        },
        subject::{
            SubjectDetailsResponse, SubjectListItem, SubjectRequest, SubjectResponse, UnitRequest,
            UnitResponse, UnitsRequest, UnitsUpdatedResponse,
        },
        user::{AccountResponse, CreateUserRequest, UpdateUserRequest, UserResponse},
    },
    routes::{
        auth, dashboard, department, faculty, marks, root, settings, student, subject, user,
    },
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        root::root,
        root::health,
        auth::login,
        auth::me,
        department::list_departments,
        department::create_department,
        department::update_department,
        department::delete_department,
        subject::list_subjects,
        subject::create_subject,
        subject::update_subject,
        subject::delete_subject,
        subject::get_subject_details,
        subject::update_subject_units,
        student::list_students,
        student::create_student,
        student::update_student,
        student::delete_student,
        student::get_student_marks,
        student::update_student_marks,
        student::bulk_upload_students,
        faculty::list_faculty,
        faculty::create_faculty,
        faculty::update_faculty,
        faculty::delete_faculty,
        faculty::assign_subject,
        faculty::my_subjects,
        user::list_users,
        user::create_user,
        user::update_user,
        user::delete_user,
        marks::roster,
        marks::bulk_save,
        dashboard::stats,
        dashboard::analytics,
        settings::settings
    ),
    components(schemas(
        MessageResponse,
        LoginRequest,
        LoginResponse,
        AccountResponse,
        UserResponse,
        CreateUserRequest,
        UpdateUserRequest,
        DepartmentResponse,
        DepartmentListItem,
        DepartmentRequest,
        SubjectResponse,
        SubjectListItem,
        SubjectRequest,
        SubjectDetailsResponse,
        UnitResponse,
        UnitRequest,
        UnitsRequest,
        UnitsUpdatedResponse,
        StudentResponse,
        StudentListItem,
        StudentRequest,
        StudentMarkResponse,
        SubjectMarksResponse,
        UnitMarksResponse,
        UpdateMarksRequest,
        BulkUploadRequest,
        FacultyListItem,
        CreateFacultyRequest,
        UpdateFacultyRequest,
        DeleteFacultyRequest,
        AssignSubjectRequest,
        AssignmentResponse,
        TaughtSubjectResponse,
        RosterResponse,
        RosterStudent,
        MarkRecord,
        BulkSaveRequest,
        BatchReportResponse,
        DashboardStats,
        AdminStatsResponse,
        HodStatsResponse,
        FacultyStatsResponse,
        AnalyticsResponse,
        DepartmentPerformanceResponse,
        SemesterPerformanceResponse,
        SettingsResponse
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness endpoints"),
        (name = "Authentication", description = "Login and the current session"),
        (name = "Departments", description = "Departments and their NBA thresholds"),
        (name = "Subjects", description = "Subjects and their units"),
        (name = "Students", description = "Students, their marks and bulk import"),
        (name = "Faculty", description = "Faculty accounts and subject assignments"),
        (name = "Users", description = "Account administration"),
        (name = "Marks", description = "Mark rosters and bulk mark entry"),
        (name = "Dashboard", description = "Dashboard figures and analytics"),
        (name = "Settings", description = "Institute settings"),
    ),
    info(
        title = "Academic Records API",
        version = "1.0.0",
        description = "Departments, subjects, students and unit marks with role-scoped access",
        license(
            name = "MIT OR Apache-2.0",
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/subjects/{id}/details",
            "/students/{id}/marks",
            "/students/bulk-upload",
            "/faculty/assign-subject",
            "/marks/bulk-save",
            "/dashboard/stats",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let schemes = doc.components.unwrap().security_schemes;
        assert!(schemes.contains_key("jwt"));
    }
}
