//! Quiz session (in-memory state)
//!
//! Holds the questions and the answering progress of one attempt. Phase
//! bookkeeping lives in the controller; this type only enforces the
//! per-question rules.

use chrono::{DateTime, Utc};
use gizz_common::events::QuizMode;
use serde::Serialize;
use uuid::Uuid;

use super::question::QuestionSet;

/// Result of submitting a choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// First answer for this question
    Recorded { correct: bool },
    /// A choice was already recorded; nothing changed
    AlreadyAnswered,
}

/// Result of moving past the current question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Now on the question at this index
    Next(usize),
    /// The answered question was the last one
    Finished,
}

/// Closing remark on the result screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreVerdict {
    Perfect,
    Solid,
    NotBad,
    Revisit,
}

impl ScoreVerdict {
    pub fn for_score(score: u32, total: usize) -> Self {
        let score = score as f64;
        let total = total as f64;
        if total > 0.0 && score >= total {
            ScoreVerdict::Perfect
        } else if score >= total * 0.7 {
            ScoreVerdict::Solid
        } else if score >= total * 0.4 {
            ScoreVerdict::NotBad
        } else {
            ScoreVerdict::Revisit
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ScoreVerdict::Perfect => "Perfect score! You're a true Gizz head.",
            ScoreVerdict::Solid => "Solid effort, you know your stuff.",
            ScoreVerdict::NotBad => "Not bad. The rabbit hole goes deeper.",
            ScoreVerdict::Revisit => "Time to revisit the discography.",
        }
    }
}

/// One quiz attempt
#[derive(Debug, Clone, Serialize)]
pub struct QuizSession {
    pub session_id: Uuid,
    pub mode: QuizMode,
    pub questions: QuestionSet,
    pub current_index: usize,
    pub score: u32,
    /// Choice recorded for the current question
    pub selected: Option<String>,
    pub poster_url: Option<String>,
    /// Archival player link offered alongside trivia
    pub embed_url: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl QuizSession {
    pub fn new(
        questions: QuestionSet,
        poster_url: Option<String>,
        embed_url: Option<String>,
    ) -> Self {
        let mode = match questions {
            QuestionSet::Trivia(_) => QuizMode::Trivia,
            QuestionSet::Audio(_) => QuizMode::Audio,
        };
        Self {
            session_id: Uuid::new_v4(),
            mode,
            questions,
            current_index: 0,
            score: 0,
            selected: None,
            poster_url,
            embed_url,
            started_at: Utc::now(),
        }
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.total()
    }

    /// Record a choice for the current question
    ///
    /// Only the first choice counts; later calls leave score and
    /// selection untouched.
    pub fn record_answer(&mut self, choice: &str) -> AnswerOutcome {
        if self.selected.is_some() {
            return AnswerOutcome::AlreadyAnswered;
        }
        let correct = self.questions.correct_answer(self.current_index) == Some(choice);
        self.selected = Some(choice.to_string());
        if correct {
            self.score += 1;
        }
        AnswerOutcome::Recorded { correct }
    }

    /// Move past the current question, clearing the selection
    pub fn advance(&mut self) -> Advance {
        if self.is_last() {
            return Advance::Finished;
        }
        self.current_index += 1;
        self.selected = None;
        Advance::Next(self.current_index)
    }

    /// Fraction of the quiz completed, counting the current question once
    /// it has been answered
    pub fn progress(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let answered = if self.is_answered() { 1 } else { 0 };
        (self.current_index + answered) as f64 / total as f64
    }

    pub fn verdict(&self) -> ScoreVerdict {
        ScoreVerdict::for_score(self.score, self.total())
    }
}
