//! Error types for gizz-quiz
//!
//! Two tiers: upstream fetch failures are absorbed by the gateway and the
//! resolver (see `services::json_source::FetchError`); insufficient-data
//! conditions surface here as [`QuizError`] and drive the session into the
//! error phase.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gizz_common::events::QuizPhase;
use serde_json::json;
use thiserror::Error;

/// User-facing quiz failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// Too few eligible catalog tracks to build trivia
    #[error("Couldn't load enough album data. Try again shortly.")]
    InsufficientCatalogData,

    /// Question assembly gave up below the minimum count
    #[error("Couldn't generate enough questions. Try again.")]
    InsufficientQuestions,

    /// No recent show links point at an archival recording
    #[error("No archival recordings found.")]
    NoArchivalRecordings,

    /// Every candidate recording failed to resolve
    #[error("Couldn't load audio tracks. Try again shortly.")]
    AudioTracksUnavailable,

    /// The requested intent is not allowed in the current phase
    #[error("Cannot {action} while {from}")]
    InvalidTransition { from: QuizPhase, action: &'static str },

    /// `next` before the current question was answered
    #[error("Answer the current question first")]
    Unanswered,
}

impl QuizError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            QuizError::InsufficientCatalogData => "INSUFFICIENT_CATALOG_DATA",
            QuizError::InsufficientQuestions => "INSUFFICIENT_QUESTIONS",
            QuizError::NoArchivalRecordings => "NO_ARCHIVAL_RECORDINGS",
            QuizError::AudioTracksUnavailable => "AUDIO_TRACKS_UNAVAILABLE",
            QuizError::InvalidTransition { .. } => "INVALID_TRANSITION",
            QuizError::Unanswered => "UNANSWERED",
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Quiz(#[from] QuizError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Quiz(ref err) => {
                let status = match err {
                    QuizError::InvalidTransition { .. } | QuizError::Unanswered => {
                        StatusCode::CONFLICT
                    }
                    _ => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, err.code(), err.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = QuizError::InvalidTransition {
            from: QuizPhase::Setup,
            action: "answer",
        };
        assert_eq!(err.to_string(), "Cannot answer while setup");
        assert_eq!(err.code(), "INVALID_TRANSITION");
    }

    #[test]
    fn test_status_mapping() {
        let conflict = ApiError::from(QuizError::InvalidTransition {
            from: QuizPhase::Done,
            action: "start",
        })
        .into_response();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let unanswered = ApiError::from(QuizError::Unanswered).into_response();
        assert_eq!(unanswered.status(), StatusCode::CONFLICT);

        for err in [
            QuizError::InsufficientCatalogData,
            QuizError::InsufficientQuestions,
            QuizError::NoArchivalRecordings,
            QuizError::AudioTracksUnavailable,
        ] {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }

        let bad = ApiError::BadRequest("empty choice".into()).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }
}
