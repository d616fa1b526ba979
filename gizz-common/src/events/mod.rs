//! Event types for the quiz event system
//!
//! Provides the shared event definitions and the EventBus.

mod quiz_types;

pub use quiz_types::{ClipState, FeedbackTone, QuizMode, QuizPhase, Waveform};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Quiz event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuizEvent {
    /// Session phase changed
    ///
    /// Triggers:
    /// - SSE: Switch the presentation between setup/loading/question/result views
    PhaseChanged {
        /// Session the change belongs to (None while in setup)
        session_id: Option<Uuid>,
        old_phase: QuizPhase,
        new_phase: QuizPhase,
        /// User-readable reason when entering the error phase
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An answer was recorded for the current question
    ///
    /// Triggers:
    /// - SSE: Play the feedback tone, reveal the correct choice
    AnswerFeedback {
        session_id: Uuid,
        /// 0-based question index
        index: usize,
        correct: bool,
        tone: FeedbackTone,
        /// Score after this answer
        score: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Moved on to the next question
    QuestionAdvanced {
        session_id: Uuid,
        /// 0-based index of the new current question
        index: usize,
        total: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Audio clip playback changed (audio mode only)
    ///
    /// Emitted on start, every countdown tick, auto-stop and halt.
    PlaybackChanged {
        state: ClipState,
        elapsed_secs: u32,
        is_playing: bool,
        has_played: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl QuizEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            QuizEvent::PhaseChanged { .. } => "PhaseChanged",
            QuizEvent::AnswerFeedback { .. } => "AnswerFeedback",
            QuizEvent::QuestionAdvanced { .. } => "QuestionAdvanced",
            QuizEvent::PlaybackChanged { .. } => "PlaybackChanged",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// Wraps tokio::broadcast:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use gizz_common::events::{EventBus, QuizEvent, QuizPhase};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(QuizEvent::PhaseChanged {
///     session_id: None,
///     old_phase: QuizPhase::Setup,
///     new_phase: QuizPhase::Loading,
///     error: None,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<QuizEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<QuizEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: QuizEvent,
    ) -> Result<usize, broadcast::error::SendError<QuizEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: QuizEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
