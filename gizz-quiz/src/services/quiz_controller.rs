//! Quiz session controller
//!
//! Owns the phase state machine and the current [`QuizSession`]:
//!
//! ```text
//! setup --start--> loading --loaded--> playing --next(last)--> done
//!                     |                                          |
//!                     +--failed--> error --retry--> setup  <--reset
//!                                                        done --play again--> loading
//! ```
//!
//! Loading is split into `begin_*` (synchronous phase change, returns an
//! attempt id) and [`QuizController::finish_start`] (the awaited fetch).
//! A load whose attempt id is no longer current when it completes is
//! discarded; its fetched data still lands in the gateway caches.

use chrono::Utc;
use gizz_common::events::{EventBus, FeedbackTone, QuizEvent};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::archive_resolver::ArchiveResolver;
use super::catalog_gateway::CatalogGateway;
use super::playback::{HeadlessAudio, PlaybackDriver, PlaybackSnapshot, ReplayOutcome};
use super::question_synth::{build_trivia_questions, TargetArtist};
use crate::error::QuizError;
use crate::models::{
    Advance, AnswerOutcome, QuestionSet, QuizMode, QuizPhase, QuizSession, ScoreVerdict,
};

/// Questions ready to become a session
struct LoadedQuiz {
    questions: QuestionSet,
    poster_url: Option<String>,
    embed_url: Option<String>,
}

struct ControllerState {
    phase: QuizPhase,
    session: Option<QuizSession>,
    last_mode: Option<QuizMode>,
    error: Option<QuizError>,
    attempt: u64,
}

/// Current question as shown to the player
///
/// `correct_answer` and `explanation` stay hidden until a choice is recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub prompt: String,
    pub choices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    pub selected: Option<String>,
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
    pub is_last: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorView {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictView {
    pub verdict: ScoreVerdict,
    pub message: &'static str,
}

/// Read-only controller state for the presentation
#[derive(Debug, Clone, Serialize)]
pub struct QuizSnapshot {
    pub phase: QuizPhase,
    pub mode: Option<QuizMode>,
    pub session_id: Option<Uuid>,
    pub question: Option<QuestionView>,
    pub score: u32,
    pub total: usize,
    pub progress: f64,
    pub poster_url: Option<String>,
    pub embed_url: Option<String>,
    pub error: Option<ErrorView>,
    pub verdict: Option<VerdictView>,
    pub playback: Option<PlaybackSnapshot>,
}

pub struct QuizController {
    gateway: Arc<CatalogGateway>,
    resolver: Arc<ArchiveResolver>,
    artist: TargetArtist,
    rng: Mutex<StdRng>,
    state: RwLock<ControllerState>,
    playback: PlaybackDriver<HeadlessAudio>,
    event_bus: EventBus,
}

impl QuizController {
    pub fn new(
        gateway: Arc<CatalogGateway>,
        resolver: Arc<ArchiveResolver>,
        playback: PlaybackDriver<HeadlessAudio>,
        event_bus: EventBus,
        rng: StdRng,
    ) -> Self {
        let artist = TargetArtist::from(gateway.config());
        Self {
            gateway,
            resolver,
            artist,
            rng: Mutex::new(rng),
            state: RwLock::new(ControllerState {
                phase: QuizPhase::Setup,
                session: None,
                last_mode: None,
                error: None,
                attempt: 0,
            }),
            playback,
            event_bus,
        }
    }

    pub fn gateway(&self) -> &Arc<CatalogGateway> {
        &self.gateway
    }

    pub async fn phase(&self) -> QuizPhase {
        self.state.read().await.phase
    }

    fn transition(&self, state: &mut ControllerState, new_phase: QuizPhase) {
        let old_phase = state.phase;
        state.phase = new_phase;
        let error = state.error.as_ref().map(|e| e.to_string());

        info!(
            old_phase = %old_phase,
            new_phase = %new_phase,
            attempt = state.attempt,
            error = error.as_deref().unwrap_or(""),
            "Quiz phase changed"
        );

        self.event_bus.emit_lossy(QuizEvent::PhaseChanged {
            session_id: state.session.as_ref().map(|s| s.session_id),
            old_phase,
            new_phase,
            error,
            timestamp: Utc::now(),
        });
    }

    fn begin_loading(&self, state: &mut ControllerState, mode: QuizMode) -> u64 {
        state.attempt += 1;
        state.session = None;
        state.error = None;
        state.last_mode = Some(mode);
        self.transition(state, QuizPhase::Loading);
        state.attempt
    }

    /// setup → loading; returns the attempt id to pass to `finish_start`
    pub async fn begin_start(&self, mode: QuizMode) -> Result<u64, QuizError> {
        let mut state = self.state.write().await;
        if state.phase != QuizPhase::Setup {
            return Err(QuizError::InvalidTransition {
                from: state.phase,
                action: "start",
            });
        }
        Ok(self.begin_loading(&mut state, mode))
    }

    /// done → loading with the mode of the finished session
    pub async fn begin_play_again(&self) -> Result<(u64, QuizMode), QuizError> {
        let mut state = self.state.write().await;
        let mode = match (state.phase, state.last_mode) {
            (QuizPhase::Done, Some(mode)) => mode,
            (from, _) => {
                return Err(QuizError::InvalidTransition {
                    from,
                    action: "play again",
                })
            }
        };
        self.playback.clear().await;
        Ok((self.begin_loading(&mut state, mode), mode))
    }

    /// Load questions for `attempt` and enter playing or error
    ///
    /// Returns the load error, if any, after the phase change. A stale
    /// attempt returns `Ok` without touching the state.
    pub async fn finish_start(&self, attempt: u64, mode: QuizMode) -> Result<(), QuizError> {
        let loaded = self.load_questions(mode).await;

        let mut state = self.state.write().await;
        if state.attempt != attempt || state.phase != QuizPhase::Loading {
            debug!(
                attempt = attempt,
                current = state.attempt,
                "Discarding result of abandoned load"
            );
            return Ok(());
        }

        match loaded {
            Ok(loaded) => {
                let session = QuizSession::new(loaded.questions, loaded.poster_url, loaded.embed_url);
                let first_clip = session.questions.audio_url(0).map(str::to_string);
                info!(
                    session_id = %session.session_id,
                    mode = %mode,
                    questions = session.total(),
                    "Quiz session started"
                );
                state.session = Some(session);
                self.transition(&mut state, QuizPhase::Playing);
                if let Some(url) = first_clip {
                    self.playback.start_clip(&url).await;
                }
                Ok(())
            }
            Err(e) => {
                warn!(mode = %mode, error = %e, "Quiz failed to start");
                state.error = Some(e.clone());
                self.transition(&mut state, QuizPhase::Error);
                Err(e)
            }
        }
    }

    /// Start a quiz and wait for loading to finish
    pub async fn start_quiz(&self, mode: QuizMode) -> Result<(), QuizError> {
        let attempt = self.begin_start(mode).await?;
        self.finish_start(attempt, mode).await
    }

    /// Replay the finished session's mode and wait for loading to finish
    pub async fn play_again(&self) -> Result<(), QuizError> {
        let (attempt, mode) = self.begin_play_again().await?;
        self.finish_start(attempt, mode).await
    }

    /// Per-load random source split off the controller's seeded generator
    async fn fork_rng(&self) -> StdRng {
        let seed: u64 = self.rng.lock().await.gen();
        StdRng::seed_from_u64(seed)
    }

    async fn load_questions(&self, mode: QuizMode) -> Result<LoadedQuiz, QuizError> {
        let mut rng = self.fork_rng().await;

        match mode {
            QuizMode::Trivia => {
                let link_limit = self.gateway.config().recent_link_limit as usize;
                let (tracks, uploads, links) = tokio::join!(
                    self.gateway.fetch_catalog(),
                    self.gateway.fetch_upload_index(),
                    self.gateway.fetch_recent_show_links(link_limit),
                );

                let questions = build_trivia_questions(&tracks, &self.artist, &mut rng)?;
                let poster_url = uploads
                    .image_urls()
                    .choose(&mut rng)
                    .map(|url| url.to_string());
                let embeds: Vec<&str> = links
                    .iter()
                    .filter(|l| l.is_archive_embed())
                    .map(|l| l.url.as_str())
                    .collect();
                let embed_url = embeds.choose(&mut rng).map(|url| url.to_string());

                Ok(LoadedQuiz {
                    questions: QuestionSet::Trivia(questions),
                    poster_url,
                    embed_url,
                })
            }
            QuizMode::Audio => {
                let quiz = self
                    .resolver
                    .build_audio_quiz_from_recent_shows(&self.gateway, &mut rng)
                    .await?;
                Ok(LoadedQuiz {
                    questions: QuestionSet::Audio(quiz.questions),
                    poster_url: quiz.poster_url,
                    embed_url: None,
                })
            }
        }
    }

    /// Record a choice for the current question
    ///
    /// A second choice for the same question is ignored.
    pub async fn submit_answer(&self, choice: &str) -> Result<AnswerOutcome, QuizError> {
        let mut state = self.state.write().await;
        let phase = state.phase;
        let session = match (phase, state.session.as_mut()) {
            (QuizPhase::Playing, Some(session)) => session,
            (from, _) => {
                return Err(QuizError::InvalidTransition {
                    from,
                    action: "answer",
                })
            }
        };

        let outcome = session.record_answer(choice);
        if let AnswerOutcome::Recorded { correct } = outcome {
            debug!(
                index = session.current_index,
                correct = correct,
                score = session.score,
                "Answer recorded"
            );
            self.event_bus.emit_lossy(QuizEvent::AnswerFeedback {
                session_id: session.session_id,
                index: session.current_index,
                correct,
                tone: FeedbackTone::for_outcome(correct),
                score: session.score,
                timestamp: Utc::now(),
            });
            if session.mode == QuizMode::Audio {
                self.playback.stop().await;
            }
        }
        Ok(outcome)
    }

    /// Move to the next question, or finish after the last one
    pub async fn advance(&self) -> Result<Advance, QuizError> {
        let mut state = self.state.write().await;
        let phase = state.phase;
        let session = match (phase, state.session.as_mut()) {
            (QuizPhase::Playing, Some(session)) => session,
            (from, _) => {
                return Err(QuizError::InvalidTransition {
                    from,
                    action: "advance",
                })
            }
        };
        if !session.is_answered() {
            return Err(QuizError::Unanswered);
        }

        self.playback.stop().await;
        let step = session.advance();
        match step {
            Advance::Next(index) => {
                let session_id = session.session_id;
                let total = session.total();
                let next_clip = session.questions.audio_url(index).map(str::to_string);
                self.event_bus.emit_lossy(QuizEvent::QuestionAdvanced {
                    session_id,
                    index,
                    total,
                    timestamp: Utc::now(),
                });
                if let Some(url) = next_clip {
                    self.playback.start_clip(&url).await;
                }
            }
            Advance::Finished => {
                info!(
                    session_id = %session.session_id,
                    score = session.score,
                    total = session.total(),
                    "Quiz finished"
                );
                self.playback.clear().await;
                self.transition(&mut state, QuizPhase::Done);
            }
        }
        Ok(step)
    }

    /// Toggle the current clip; audio mode only
    pub async fn replay(&self) -> Result<ReplayOutcome, QuizError> {
        let state = self.state.read().await;
        let answered = match (state.phase, state.session.as_ref()) {
            (QuizPhase::Playing, Some(session)) if session.mode == QuizMode::Audio => {
                session.is_answered()
            }
            (from, _) => {
                return Err(QuizError::InvalidTransition {
                    from,
                    action: "replay",
                })
            }
        };
        Ok(self.playback.replay(answered).await)
    }

    /// error → setup
    pub async fn retry(&self) -> Result<(), QuizError> {
        let mut state = self.state.write().await;
        if state.phase != QuizPhase::Error {
            return Err(QuizError::InvalidTransition {
                from: state.phase,
                action: "retry",
            });
        }
        state.error = None;
        self.transition(&mut state, QuizPhase::Setup);
        Ok(())
    }

    /// Back to setup from any phase, abandoning the current attempt
    pub async fn reset_to_setup(&self) {
        let mut state = self.state.write().await;
        self.playback.clear().await;
        state.attempt += 1;
        state.error = None;
        if state.phase != QuizPhase::Setup {
            self.transition(&mut state, QuizPhase::Setup);
        }
        state.session = None;
    }

    pub async fn snapshot(&self) -> QuizSnapshot {
        let state = self.state.read().await;
        let session = state.session.as_ref();

        let question = session.and_then(|s| {
            let index = s.current_index;
            let answered = s.is_answered();
            Some(QuestionView {
                index,
                prompt: s.questions.prompt(index)?.to_string(),
                choices: s.questions.choices(index)?.to_vec(),
                audio_url: s.questions.audio_url(index).map(str::to_string),
                selected: s.selected.clone(),
                correct_answer: answered
                    .then(|| s.questions.correct_answer(index).map(str::to_string))
                    .flatten(),
                explanation: answered
                    .then(|| s.questions.explanation(index).map(str::to_string))
                    .flatten(),
                is_last: s.is_last(),
            })
        });

        let verdict = match (state.phase, session) {
            (QuizPhase::Done, Some(s)) => {
                let verdict = s.verdict();
                Some(VerdictView {
                    verdict,
                    message: verdict.message(),
                })
            }
            _ => None,
        };

        let playback = match session {
            Some(s) if s.mode == QuizMode::Audio => Some(self.playback.snapshot().await),
            _ => None,
        };

        QuizSnapshot {
            phase: state.phase,
            mode: session.map(|s| s.mode).or(state.last_mode),
            session_id: session.map(|s| s.session_id),
            question,
            score: session.map(|s| s.score).unwrap_or(0),
            total: session.map(|s| s.total()).unwrap_or(0),
            progress: session.map(|s| s.progress()).unwrap_or(0.0),
            poster_url: session.and_then(|s| s.poster_url.clone()),
            embed_url: session.and_then(|s| s.embed_url.clone()),
            error: state.error.as_ref().map(|e| ErrorView {
                code: e.code(),
                message: e.to_string(),
            }),
            verdict,
            playback,
        }
    }
}
