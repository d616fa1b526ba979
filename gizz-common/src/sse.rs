//! Server-Sent Events (SSE) utilities

use crate::events::{EventBus, QuizEvent};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Heartbeat period for every SSE stream
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Convert a quiz event into an SSE frame
///
/// Returns None when the event cannot be serialized.
pub fn to_sse_event(event: &QuizEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event(event.event_type()).data(json)),
        Err(e) => {
            warn!("SSE: Failed to serialize event {}: {}", event.event_type(), e);
            None
        }
    }
}

/// Create an SSE stream forwarding every event on the bus
///
/// Sends a `ConnectionStatus` frame first, then events as they arrive.
/// Lagging clients skip the events they missed and keep streaming.
pub fn create_event_sse_stream(
    service_name: &'static str,
    event_bus: &EventBus,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);

    let mut rx = event_bus.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(frame) = to_sse_event(&event) {
                        debug!("SSE: Broadcasting {}", event.event_type());
                        yield Ok(frame);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE: {} client lagged, skipped {} events", service_name, skipped);
                }
                Err(RecvError::Closed) => {
                    info!("SSE: {} event bus closed", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}
