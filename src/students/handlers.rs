use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::extractors::CurrentUser,
    error::{AppError, AppResult},
    state::AppState,
    students::{
        dto::{CreateStudentRequest, DeleteStudentResponse, StudentResponse, UpdateStudentRequest},
        repo,
        repo_types::Student,
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/students", post(create_student).get(list_students))
        .route(
            "/students/:student_id",
            get(get_student).put(update_student).delete(delete_student),
        )
}

/// Activity rows feed the 7-day metric; a miss there should not fail the
/// request that already committed.
async fn log_activity(state: &AppState, student_id: &str, activity: &str) {
    if let Err(e) = repo::log_activity(&state.db, student_id, activity).await {
        error!(error = %e, student_id, activity, "activity log write failed");
    }
}

#[instrument(skip(state, _user, payload))]
pub async fn create_student(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(payload): Json<CreateStudentRequest>,
) -> AppResult<(StatusCode, Json<StudentResponse>)> {
    if Student::find(&state.db, &payload.student_id).await?.is_some() {
        return Err(AppError::Conflict("Student already exists".into()));
    }

    let student = Student::create(
        &state.db,
        &payload.student_id,
        &payload.name,
        &payload.department,
        &payload.email,
    )
    .await?;

    log_activity(&state, &student.student_id, "created").await;
    info!(student_id = %student.student_id, "student onboarded");
    Ok((StatusCode::CREATED, Json(StudentResponse::from(student))))
}

#[instrument(skip(state, _user))]
pub async fn get_student(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(student_id): Path<String>,
) -> AppResult<Json<StudentResponse>> {
    let student = Student::find(&state.db, &student_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))?;
    Ok(Json(StudentResponse::from(student)))
}

#[instrument(skip(state, _user))]
pub async fn list_students(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> AppResult<Json<Vec<StudentResponse>>> {
    let students = Student::list(&state.db).await?;
    Ok(Json(
        students.into_iter().map(StudentResponse::from).collect(),
    ))
}

#[instrument(skip(state, _user, payload))]
pub async fn update_student(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(student_id): Path<String>,
    Json(payload): Json<UpdateStudentRequest>,
) -> AppResult<Json<StudentResponse>> {
    let student = Student::update(
        &state.db,
        &student_id,
        payload.name.as_deref(),
        payload.department.as_deref(),
        payload.email.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Student not found".into()))?;

    log_activity(&state, &student.student_id, "updated").await;
    Ok(Json(StudentResponse::from(student)))
}

#[instrument(skip(state, _user))]
pub async fn delete_student(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(student_id): Path<String>,
) -> AppResult<Json<DeleteStudentResponse>> {
    let deleted = Student::delete(&state.db, &student_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Student not found".into()));
    }

    log_activity(&state, &student_id, "deleted").await;
    info!(student_id = %student_id, "student deleted");
    Ok(Json(DeleteStudentResponse { deleted: true }))
}
