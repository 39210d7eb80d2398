use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use time::Duration;
use tracing::instrument;

use crate::{
    auth::extractors::CurrentUser,
    error::AppResult,
    state::AppState,
    students::{
        dto::StudentResponse,
        repo,
        repo_types::{DepartmentCount, Student},
    },
};

const RECENT_LIMIT: i64 = 5;
const ACTIVITY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub total_students: i64,
    pub students_by_department: Vec<DepartmentCount>,
    pub recent_onboarded: Vec<StudentResponse>,
    pub active_last_7_days: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/analytics", get(summary))
}

#[instrument(skip(state, _user))]
pub async fn summary(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> AppResult<Json<AnalyticsResponse>> {
    let total_students = Student::count(&state.db).await?;
    let students_by_department = Student::count_by_department(&state.db).await?;
    let recent = Student::recent(&state.db, RECENT_LIMIT).await?;
    let active_last_7_days =
        repo::active_students_since(&state.db, Duration::days(ACTIVITY_WINDOW_DAYS)).await?;

    Ok(Json(AnalyticsResponse {
        total_students,
        students_by_department,
        recent_onboarded: recent.into_iter().map(StudentResponse::from).collect(),
        active_last_7_days,
    }))
}
