//! gizz-quiz library interface
//!
//! Trivia and name-that-tune quiz engine: catalog gateway, archive
//! resolver, question synthesizer, session controller and clip playback,
//! exposed over HTTP + SSE.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult, QuizError};

use axum::Router;
use chrono::{DateTime, Utc};
use gizz_common::config::TomlConfig;
use gizz_common::events::EventBus;
use rand::rngs::StdRng;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::{
    ArchiveResolver, CatalogGateway, ClipWindow, HeadlessAudio, JsonSource, PlaybackController,
    PlaybackDriver, QuizController, TickSource,
};

/// Events buffered per SSE subscriber
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<QuizController>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(controller: Arc<QuizController>, event_bus: EventBus) -> Self {
        Self {
            controller,
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Wire gateway, resolver, playback and controller around one JSON source
///
/// Each call builds fresh caches, so tests get an isolated engine per run.
pub fn build_engine(
    config: &TomlConfig,
    source: Arc<dyn JsonSource>,
    ticks: Arc<dyn TickSource>,
    rng: StdRng,
) -> AppState {
    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);

    let gateway = Arc::new(CatalogGateway::new(
        Arc::clone(&source),
        config.catalog.clone(),
    ));
    let resolver = Arc::new(ArchiveResolver::new(source, config.archive.clone()));
    let playback = PlaybackDriver::new(
        PlaybackController::new(HeadlessAudio::default(), ClipWindow::from(&config.playback)),
        ticks,
        event_bus.clone(),
    );
    let controller = Arc::new(QuizController::new(
        gateway,
        resolver,
        playback,
        event_bus.clone(),
        rng,
    ));

    AppState::new(controller, event_bus)
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::quiz_routes())
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
