pub mod auth;
pub mod config;
pub mod doc;
pub mod dtos;
pub mod error;
pub mod routes;
pub mod state;
pub mod utils;

use crate::{
    doc::ApiDoc,
    routes::{
        auth as auth_routes, dashboard, department, faculty, marks, root, settings, student,
        subject, user,
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::compression::CompressionLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the HTTP surface over the shared state
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root::root))
        .route("/health", get(root::health))
        .route("/auth/login", post(auth_routes::login))
        .route("/auth/me", get(auth_routes::me))
        .route(
            "/departments",
            get(department::list_departments).post(department::create_department),
        )
        .route(
            "/departments/{id}",
            put(department::update_department).delete(department::delete_department),
        )
        .route(
            "/subjects",
            get(subject::list_subjects).post(subject::create_subject),
        )
        .route(
            "/subjects/{id}",
            put(subject::update_subject).delete(subject::delete_subject),
        )
        .route(
            "/subjects/{id}/details",
            get(subject::get_subject_details).put(subject::update_subject_units),
        )
        .route(
            "/students",
            get(student::list_students).post(student::create_student),
        )
        .route("/students/bulk-upload", post(student::bulk_upload_students))
        .route(
            "/students/{id}",
            put(student::update_student).delete(student::delete_student),
        )
        .route(
            "/students/{id}/marks",
            get(student::get_student_marks).put(student::update_student_marks),
        )
        .route(
            "/faculty",
            get(faculty::list_faculty)
                .post(faculty::create_faculty)
                .put(faculty::update_faculty)
                .delete(faculty::delete_faculty),
        )
        .route("/faculty/assign-subject", post(faculty::assign_subject))
        .route("/faculty/my-subjects", get(faculty::my_subjects))
        .route("/users", get(user::list_users).post(user::create_user))
        .route(
            "/users/{id}",
            put(user::update_user).delete(user::delete_user),
        )
        .route("/marks/students", get(marks::roster))
        .route("/marks/bulk-save", post(marks::bulk_save))
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/analytics", get(dashboard::analytics))
        .route("/settings", get(settings::settings))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .with_state(state)
}
