//! Data models for the quiz engine

pub mod catalog;
pub mod question;
pub mod session;

pub use catalog::{
    release_year, AlbumEntry, AlbumIndex, ArchiveManifest, ManifestTrack, ShowLink, Track,
    UploadIndex, POSTER_ART_TAG, UNKNOWN_YEAR,
};
pub use gizz_common::events::{ClipState, QuizMode, QuizPhase};
pub use question::{AudioQuestion, QuestionSet, TriviaKind, TriviaQuestion, AUDIO_PROMPT};
pub use session::{Advance, AnswerOutcome, QuizSession, ScoreVerdict};
