//! Quiz lifecycle type definitions
//!
//! Supporting types shared between the engine, its HTTP surface and events.

use serde::{Deserialize, Serialize};

/// Quiz session phase
///
/// setup → loading → playing → done, with error reachable from loading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QuizPhase {
    /// Waiting for the user to start
    Setup,
    /// Fetching data and synthesizing questions
    Loading,
    /// Questions are being answered
    Playing,
    /// All questions answered, score final
    Done,
    /// The last attempt failed; recoverable by retry/reset
    Error,
}

impl std::fmt::Display for QuizPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuizPhase::Setup => write!(f, "setup"),
            QuizPhase::Loading => write!(f, "loading"),
            QuizPhase::Playing => write!(f, "playing"),
            QuizPhase::Done => write!(f, "done"),
            QuizPhase::Error => write!(f, "error"),
        }
    }
}

/// Kind of questions in a session (never mixed)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    /// Multiple-choice discography trivia
    Trivia,
    /// Name-that-tune from archival live recordings
    Audio,
}

impl std::fmt::Display for QuizMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuizMode::Trivia => write!(f, "trivia"),
            QuizMode::Audio => write!(f, "audio"),
        }
    }
}

/// Audio clip playback state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClipState {
    /// No clip loaded, or playback halted
    Idle,
    /// Source set and seeked, waiting for playback to begin
    Priming,
    /// Clip audible, countdown running
    Playing,
    /// Clip window exhausted or toggled off by the user
    Finished,
}

impl std::fmt::Display for ClipState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClipState::Idle => write!(f, "idle"),
            ClipState::Priming => write!(f, "priming"),
            ClipState::Playing => write!(f, "playing"),
            ClipState::Finished => write!(f, "finished"),
        }
    }
}

/// Oscillator shape for answer feedback
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Sawtooth,
}

/// Two-step tone the presentation layer can synthesize after an answer
///
/// Frequency starts at `start_hz` and jumps to `end_hz` after
/// `step_after_ms`; gain decays exponentially to silence over `duration_ms`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeedbackTone {
    pub waveform: Waveform,
    pub start_hz: f32,
    pub end_hz: f32,
    pub step_after_ms: u32,
    pub gain: f32,
    pub duration_ms: u32,
}

impl FeedbackTone {
    /// Rising C5 → G5 chime
    pub fn correct() -> Self {
        Self {
            waveform: Waveform::Sine,
            start_hz: 523.25,
            end_hz: 783.99,
            step_after_ms: 150,
            gain: 0.18,
            duration_ms: 500,
        }
    }

    /// Falling buzz
    pub fn wrong() -> Self {
        Self {
            waveform: Waveform::Sawtooth,
            start_hz: 220.0,
            end_hz: 160.0,
            step_after_ms: 120,
            gain: 0.12,
            duration_ms: 350,
        }
    }

    pub fn for_outcome(correct: bool) -> Self {
        if correct {
            Self::correct()
        } else {
            Self::wrong()
        }
    }
}
