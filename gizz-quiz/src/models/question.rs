//! Quiz question types

use serde::Serialize;

/// Trivia category, drawn with weights 50/30/20
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriviaKind {
    /// Which album contains song X
    AlbumOfSong,
    /// What year was album X released
    ReleaseYear,
    /// Is song X an original or a cover
    OriginalOrCover,
}

/// Multiple-choice discography question
///
/// Choices are unique and contain the correct answer exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriviaQuestion {
    pub kind: TriviaKind,
    pub prompt: String,
    pub correct_answer: String,
    pub choices: Vec<String>,
    /// Shown after answering (cover questions only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Name-that-tune question for one clip of a live recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioQuestion {
    pub audio_url: String,
    /// Song title with live qualifiers stripped
    pub correct_title: String,
    pub choices: Vec<String>,
}

/// Prompt shown for every audio question
pub const AUDIO_PROMPT: &str = "Name this song";

/// Questions of one session; a session never mixes kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "questions", rename_all = "lowercase")]
pub enum QuestionSet {
    Trivia(Vec<TriviaQuestion>),
    Audio(Vec<AudioQuestion>),
}

impl QuestionSet {
    pub fn len(&self) -> usize {
        match self {
            QuestionSet::Trivia(qs) => qs.len(),
            QuestionSet::Audio(qs) => qs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn prompt(&self, index: usize) -> Option<&str> {
        match self {
            QuestionSet::Trivia(qs) => qs.get(index).map(|q| q.prompt.as_str()),
            QuestionSet::Audio(qs) => qs.get(index).map(|_| AUDIO_PROMPT),
        }
    }

    pub fn correct_answer(&self, index: usize) -> Option<&str> {
        match self {
            QuestionSet::Trivia(qs) => qs.get(index).map(|q| q.correct_answer.as_str()),
            QuestionSet::Audio(qs) => qs.get(index).map(|q| q.correct_title.as_str()),
        }
    }

    pub fn choices(&self, index: usize) -> Option<&[String]> {
        match self {
            QuestionSet::Trivia(qs) => qs.get(index).map(|q| q.choices.as_slice()),
            QuestionSet::Audio(qs) => qs.get(index).map(|q| q.choices.as_slice()),
        }
    }

    pub fn explanation(&self, index: usize) -> Option<&str> {
        match self {
            QuestionSet::Trivia(qs) => qs.get(index).and_then(|q| q.explanation.as_deref()),
            QuestionSet::Audio(_) => None,
        }
    }

    pub fn audio_url(&self, index: usize) -> Option<&str> {
        match self {
            QuestionSet::Trivia(_) => None,
            QuestionSet::Audio(qs) => qs.get(index).map(|q| q.audio_url.as_str()),
        }
    }
}
