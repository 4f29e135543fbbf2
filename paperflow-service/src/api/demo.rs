//! Demo mode API endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::demo::{
    DashboardData, DashboardFilters, DemoLoginRequest, DemoLoginResponse, NewWrongQuestion,
    PracticeResult, QuestionStatus, WrongQuestion,
};
use crate::error::ServiceError;

use super::AppState;

/// Status update request
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: QuestionStatus,
}

/// Practice record request
#[derive(Deserialize)]
pub struct PracticeRequest {
    pub result: PracticeResult,
}

/// Reset response
#[derive(Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
}

/// Demo student login (auto-creates unknown students)
pub async fn demo_login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DemoLoginRequest>,
) -> Result<Json<DemoLoginResponse>, ServiceError> {
    Ok(Json(state.service.demo.login(request)?))
}

/// Dashboard data for one student
pub async fn demo_dashboard_handler(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<i64>,
    Query(filters): Query<DashboardFilters>,
) -> Result<Json<DashboardData>, ServiceError> {
    Ok(Json(state.service.demo.dashboard(student_id, &filters)?))
}

/// Log a new wrong question for a student
pub async fn demo_question_handler(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<i64>,
    Json(payload): Json<NewWrongQuestion>,
) -> Result<Json<WrongQuestion>, ServiceError> {
    Ok(Json(
        state.service.demo.create_wrong_question(student_id, payload)?,
    ))
}

/// Set the review status of a wrong question
pub async fn demo_question_status_handler(
    State(state): State<Arc<AppState>>,
    Path((student_id, question_id)): Path<(i64, i64)>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<WrongQuestion>, ServiceError> {
    Ok(Json(state.service.demo.set_question_status(
        student_id,
        question_id,
        request.status,
    )?))
}

/// Record a practice attempt against a wrong question
pub async fn demo_practice_handler(
    State(state): State<Arc<AppState>>,
    Path((student_id, question_id)): Path<(i64, i64)>,
    Json(request): Json<PracticeRequest>,
) -> Result<Json<WrongQuestion>, ServiceError> {
    Ok(Json(state.service.demo.record_practice(
        student_id,
        question_id,
        request.result,
    )?))
}

/// Discard the demo dataset; the next access reseeds defaults
pub async fn demo_reset_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResetResponse>, ServiceError> {
    state.service.demo.reset()?;
    Ok(Json(ResetResponse {
        success: true,
        message: "Demo dataset reset".to_string(),
    }))
}
