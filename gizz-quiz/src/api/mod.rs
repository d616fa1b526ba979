//! HTTP API handlers for gizz-quiz
//!
//! JSON intents in, [`QuizSnapshot`](crate::services::QuizSnapshot) out, plus
//! an SSE stream of quiz events for the presentation layer.

pub mod health;
pub mod quiz;
pub mod sse;

pub use health::health_routes;
pub use quiz::quiz_routes;
pub use sse::event_stream;
