//! Server-Sent Events for quiz updates

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /events
///
/// Streams every `QuizEvent`: phase changes, answer feedback tones,
/// question advances and the clip countdown.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    gizz_common::sse::create_event_sse_stream("gizz-quiz", &state.event_bus)
}
