//! Quiz intent handlers
//!
//! GET /quiz, POST /quiz/{start,answer,next,replay,retry,play-again,reset}

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::models::{AnswerOutcome, QuizMode};
use crate::services::{QuizController, QuizSnapshot, ReplayOutcome};
use crate::AppState;

/// POST /quiz/start request
#[derive(Debug, Deserialize)]
pub struct StartQuizRequest {
    pub mode: QuizMode,
}

/// POST /quiz/answer request
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub choice: String,
}

/// POST /quiz/answer response
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub outcome: AnswerOutcome,
    pub snapshot: QuizSnapshot,
}

/// POST /quiz/replay response
#[derive(Debug, Serialize)]
pub struct ReplayResponse {
    pub outcome: ReplayOutcome,
    pub snapshot: QuizSnapshot,
}

/// Finish loading in the background; the outcome arrives as a phase event
fn spawn_load(controller: Arc<QuizController>, attempt: u64, mode: QuizMode) {
    tokio::spawn(async move {
        if let Err(e) = controller.finish_start(attempt, mode).await {
            tracing::debug!(attempt = attempt, error = %e, "Background load ended in error phase");
        }
    });
}

/// GET /quiz
pub async fn get_quiz(State(state): State<AppState>) -> Json<QuizSnapshot> {
    Json(state.controller.snapshot().await)
}

/// POST /quiz/start
///
/// Returns 202 Accepted in the loading phase; 409 outside setup.
pub async fn start_quiz(
    State(state): State<AppState>,
    Json(request): Json<StartQuizRequest>,
) -> ApiResult<(StatusCode, Json<QuizSnapshot>)> {
    let attempt = state.controller.begin_start(request.mode).await?;
    tracing::info!(mode = %request.mode, attempt = attempt, "Quiz start requested");

    let snapshot = state.controller.snapshot().await;
    spawn_load(Arc::clone(&state.controller), attempt, request.mode);
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// POST /quiz/answer
pub async fn submit_answer(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> ApiResult<Json<AnswerResponse>> {
    if request.choice.trim().is_empty() {
        return Err(ApiError::BadRequest("choice must not be empty".to_string()));
    }
    let outcome = state.controller.submit_answer(&request.choice).await?;
    Ok(Json(AnswerResponse {
        outcome,
        snapshot: state.controller.snapshot().await,
    }))
}

/// POST /quiz/next
pub async fn next_question(State(state): State<AppState>) -> ApiResult<Json<QuizSnapshot>> {
    state.controller.advance().await?;
    Ok(Json(state.controller.snapshot().await))
}

/// POST /quiz/replay
pub async fn replay_clip(State(state): State<AppState>) -> ApiResult<Json<ReplayResponse>> {
    let outcome = state.controller.replay().await?;
    Ok(Json(ReplayResponse {
        outcome,
        snapshot: state.controller.snapshot().await,
    }))
}

/// POST /quiz/retry
pub async fn retry(State(state): State<AppState>) -> ApiResult<Json<QuizSnapshot>> {
    state.controller.retry().await?;
    Ok(Json(state.controller.snapshot().await))
}

/// POST /quiz/play-again
pub async fn play_again(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<QuizSnapshot>)> {
    let (attempt, mode) = state.controller.begin_play_again().await?;
    let snapshot = state.controller.snapshot().await;
    spawn_load(Arc::clone(&state.controller), attempt, mode);
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// POST /quiz/reset
pub async fn reset(State(state): State<AppState>) -> Json<QuizSnapshot> {
    state.controller.reset_to_setup().await;
    Json(state.controller.snapshot().await)
}

/// Build quiz routes
pub fn quiz_routes() -> Router<AppState> {
    Router::new()
        .route("/quiz", get(get_quiz))
        .route("/quiz/start", post(start_quiz))
        .route("/quiz/answer", post(submit_answer))
        .route("/quiz/next", post(next_question))
        .route("/quiz/replay", post(replay_clip))
        .route("/quiz/retry", post(retry))
        .route("/quiz/play-again", post(play_again))
        .route("/quiz/reset", post(reset))
}
