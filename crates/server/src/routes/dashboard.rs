use crate::{
    auth::AuthUser,
    dtos::stats::{AnalyticsQuery, AnalyticsResponse, DashboardStats},
    error::{AppError, AppResult},
    state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
};
use database::services::stats::StatsService;
use models::{analytics::summarize, role::Role};

/// Headline figures for the caller's dashboard
#[utoipa::path(
    get,
    path = "/dashboard/stats",
    responses(
        (status = 200, description = "Counts for administrators, department figures for HODs, teaching progress for faculty", body = DashboardStats),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Dashboard"
)]
pub async fn stats(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<DashboardStats>> {
    let stats: DashboardStats = match user.principal.role {
        Role::Admin => StatsService::admin(&state.db).await.map(Into::into),
        Role::Hod => StatsService::hod(&state.db, &user.scope())
            .await
            .map(Into::into),
        Role::Faculty => StatsService::faculty(&state.db, user.id())
            .await
            .map(Into::into),
    }
    .map_err(AppError::db("Internal server error"))?;

    Ok(Json(stats))
}

/// Performance and NBA compliance computed from the marks the caller can see
#[utoipa::path(
    get,
    path = "/analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Analytics summary", body = AnalyticsResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Dashboard"
)]
pub async fn analytics(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<AnalyticsResponse>> {
    let samples =
        StatsService::mark_samples(&state.db, &user.scope(), query.department, query.semester)
            .await
            .map_err(AppError::db("Internal server error"))?;

    let departments = StatsService::department_info(&state.db)
        .await
        .map_err(AppError::db("Internal server error"))?;

    Ok(Json(summarize(&samples, &departments).into()))
}
