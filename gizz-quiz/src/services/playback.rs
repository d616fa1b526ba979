//! Clip playback for audio questions
//!
//! [`PlaybackController`] is a synchronous state machine over
//! [`ClipState`]: loading a clip primes the audio element, a successful
//! play moves to `Playing`, each one-second tick advances the elapsed
//! counter, and reaching the clip ceiling moves to `Finished`.
//!
//! [`PlaybackDriver`] owns the controller together with the tick task for
//! the current clip. Every clip gets its own [`CancellationToken`]; loading
//! a new clip, replaying, stopping or resetting cancels the previous one,
//! so no timer outlives the question it was started for.

use chrono::Utc;
use futures::stream::{BoxStream, StreamExt};
use gizz_common::config::PlaybackConfig;
use gizz_common::events::{ClipState, EventBus, QuizEvent};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Audio element refused to start
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("playback blocked: {0}")]
    Blocked(String),

    #[error("no source loaded")]
    NoSource,
}

/// The media element a clip is played through
pub trait AudioElement: Send {
    fn set_source(&mut self, url: &str);
    fn seek(&mut self, position_secs: u32);
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
}

/// Audio element without output
///
/// The service does not produce sound itself; the presentation plays the
/// clip and follows `PlaybackChanged` events. This element only tracks
/// what the presentation is expected to be doing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadlessAudio {
    pub source: Option<String>,
    pub position_secs: u32,
    pub playing: bool,
}

impl AudioElement for HeadlessAudio {
    fn set_source(&mut self, url: &str) {
        self.source = Some(url.to_string());
        self.position_secs = 0;
        self.playing = false;
    }

    fn seek(&mut self, position_secs: u32) {
        self.position_secs = position_secs;
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.source.is_none() {
            return Err(PlaybackError::NoSource);
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }
}

/// Start offset and length of the sampled segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClipWindow {
    pub start_secs: u32,
    pub duration_secs: u32,
}

impl From<&PlaybackConfig> for ClipWindow {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            start_secs: config.clip_start_secs,
            duration_secs: config.clip_duration_secs,
        }
    }
}

/// What a replay request did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayOutcome {
    Started,
    Stopped,
    /// An answer was already submitted, or no clip is loaded
    Ignored,
}

/// Read-only playback view for snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackSnapshot {
    pub state: ClipState,
    pub source: Option<String>,
    pub elapsed_secs: u32,
    pub clip_duration_secs: u32,
    pub is_playing: bool,
    pub has_played: bool,
}

pub struct PlaybackController<A: AudioElement> {
    audio: A,
    window: ClipWindow,
    state: ClipState,
    source: Option<String>,
    elapsed_secs: u32,
    is_playing: bool,
    has_played: bool,
}

impl<A: AudioElement> PlaybackController<A> {
    pub fn new(audio: A, window: ClipWindow) -> Self {
        Self {
            audio,
            window,
            state: ClipState::Idle,
            source: None,
            elapsed_secs: 0,
            is_playing: false,
            has_played: false,
        }
    }

    pub fn state(&self) -> ClipState {
        self.state
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn has_played(&self) -> bool {
        self.has_played
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// Switch to a new clip and try to start it
    ///
    /// Returns whether playback actually started. A refused start leaves
    /// the clip primed so it can be replayed manually.
    pub fn load_clip(&mut self, url: &str) -> bool {
        self.audio.pause();
        self.source = Some(url.to_string());
        self.elapsed_secs = 0;
        self.is_playing = false;
        self.has_played = false;
        self.audio.set_source(url);
        self.audio.seek(self.window.start_secs);
        self.state = ClipState::Priming;
        self.start()
    }

    fn start(&mut self) -> bool {
        match self.audio.play() {
            Ok(()) => {
                self.state = ClipState::Playing;
                self.is_playing = true;
                self.has_played = true;
                true
            }
            Err(e) => {
                debug!(error = %e, "Clip start refused, replay stays available");
                self.state = ClipState::Priming;
                self.is_playing = false;
                false
            }
        }
    }

    /// One second of playback; returns true if anything changed
    pub fn tick(&mut self) -> bool {
        if self.state != ClipState::Playing {
            return false;
        }
        self.elapsed_secs = (self.elapsed_secs + 1).min(self.window.duration_secs);
        if self.elapsed_secs >= self.window.duration_secs {
            self.audio.pause();
            self.is_playing = false;
            self.state = ClipState::Finished;
        }
        true
    }

    /// Toggle playback of the current clip; only before answering
    pub fn replay(&mut self, answered: bool) -> ReplayOutcome {
        if answered || self.source.is_none() {
            return ReplayOutcome::Ignored;
        }
        if self.is_playing {
            self.halt();
            return ReplayOutcome::Stopped;
        }
        self.elapsed_secs = 0;
        self.audio.seek(self.window.start_secs);
        if self.start() {
            ReplayOutcome::Started
        } else {
            ReplayOutcome::Ignored
        }
    }

    /// Stop playback of the current clip, keeping the clip loaded
    pub fn halt(&mut self) {
        self.audio.pause();
        self.is_playing = false;
        if self.state == ClipState::Playing {
            self.state = ClipState::Finished;
        }
    }

    /// Drop the clip entirely
    pub fn clear(&mut self) {
        self.audio.pause();
        self.source = None;
        self.elapsed_secs = 0;
        self.is_playing = false;
        self.has_played = false;
        self.state = ClipState::Idle;
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state,
            source: self.source.clone(),
            elapsed_secs: self.elapsed_secs,
            clip_duration_secs: self.window.duration_secs,
            is_playing: self.is_playing,
            has_played: self.has_played,
        }
    }

    fn changed_event(&self) -> QuizEvent {
        QuizEvent::PlaybackChanged {
            state: self.state,
            elapsed_secs: self.elapsed_secs,
            is_playing: self.is_playing,
            has_played: self.has_played,
            timestamp: Utc::now(),
        }
    }
}

/// Clock abstraction driving the countdown
pub trait TickSource: Send + Sync {
    /// A fresh stream of ticks, starting one period from now
    fn ticks(&self) -> BoxStream<'static, ()>;
}

/// Real-time ticks from a tokio interval
#[derive(Debug, Clone, Copy)]
pub struct IntervalTicks {
    period: Duration,
}

impl IntervalTicks {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl TickSource for IntervalTicks {
    fn ticks(&self) -> BoxStream<'static, ()> {
        let start = tokio::time::Instant::now() + self.period;
        let mut interval = tokio::time::interval_at(start, self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        IntervalStream::new(interval).map(|_| ()).boxed()
    }
}

/// Ticks fired by hand, for deterministic countdown tests
#[derive(Debug, Clone)]
pub struct ManualTicks {
    tx: broadcast::Sender<()>,
}

impl ManualTicks {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Fire `count` ticks to every active stream
    pub fn advance(&self, count: u32) {
        for _ in 0..count {
            let _ = self.tx.send(());
        }
    }
}

impl Default for ManualTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for ManualTicks {
    fn ticks(&self) -> BoxStream<'static, ()> {
        BroadcastStream::new(self.tx.subscribe())
            .filter_map(|tick| futures::future::ready(tick.ok()))
            .boxed()
    }
}

/// Playback controller plus the timer task of the current clip
pub struct PlaybackDriver<A: AudioElement + 'static> {
    controller: Arc<Mutex<PlaybackController<A>>>,
    ticks: Arc<dyn TickSource>,
    event_bus: EventBus,
    timer: Arc<Mutex<Option<CancellationToken>>>,
}

impl<A: AudioElement + 'static> PlaybackDriver<A> {
    pub fn new(
        controller: PlaybackController<A>,
        ticks: Arc<dyn TickSource>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            ticks,
            event_bus,
            timer: Arc::new(Mutex::new(None)),
        }
    }

    /// Load and start the clip for a new question
    pub async fn start_clip(&self, url: &str) {
        self.cancel_timer().await;
        let mut controller = self.controller.lock().await;
        let started = controller.load_clip(url);
        self.event_bus.emit_lossy(controller.changed_event());
        drop(controller);

        if started {
            self.spawn_timer().await;
        }
    }

    /// Manual replay toggle for the current clip
    pub async fn replay(&self, answered: bool) -> ReplayOutcome {
        self.cancel_timer().await;
        let mut controller = self.controller.lock().await;
        let outcome = controller.replay(answered);
        if outcome != ReplayOutcome::Ignored {
            self.event_bus.emit_lossy(controller.changed_event());
        }
        let playing = controller.is_playing();
        drop(controller);

        if playing {
            self.spawn_timer().await;
        }
        outcome
    }

    /// Stop the clip at a question boundary
    pub async fn stop(&self) {
        self.cancel_timer().await;
        let mut controller = self.controller.lock().await;
        let was_playing = controller.is_playing();
        controller.halt();
        if was_playing {
            self.event_bus.emit_lossy(controller.changed_event());
        }
    }

    /// Forget the clip (session ended or abandoned)
    pub async fn clear(&self) {
        self.cancel_timer().await;
        let mut controller = self.controller.lock().await;
        if controller.state() != ClipState::Idle {
            controller.clear();
            self.event_bus.emit_lossy(controller.changed_event());
        }
    }

    pub async fn snapshot(&self) -> PlaybackSnapshot {
        self.controller.lock().await.snapshot()
    }

    /// Whether a clip timer is still counting
    pub async fn has_timer(&self) -> bool {
        self.timer.lock().await.is_some()
    }

    async fn cancel_timer(&self) {
        if let Some(token) = self.timer.lock().await.take() {
            token.cancel();
        }
    }

    async fn spawn_timer(&self) {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let mut ticks = self.ticks.ticks();
        let controller = Arc::clone(&self.controller);
        let event_bus = self.event_bus.clone();
        let slot = Arc::clone(&self.timer);

        *self.timer.lock().await = Some(token);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    tick = ticks.next() => {
                        if tick.is_none() {
                            warn!("Tick source ended before the clip finished");
                            break;
                        }
                        let mut controller = controller.lock().await;
                        if task_token.is_cancelled() {
                            break;
                        }
                        if controller.tick() {
                            event_bus.emit_lossy(controller.changed_event());
                        }
                        if !controller.is_playing() {
                            debug!(elapsed = controller.elapsed_secs(), "Clip timer finished");
                            break;
                        }
                    }
                }
            }

            // Cancellation always happens under the slot lock, so an
            // uncancelled token here is still the one in the slot
            let mut slot = slot.lock().await;
            if !task_token.is_cancelled() {
                slot.take();
            }
        });
    }
}
