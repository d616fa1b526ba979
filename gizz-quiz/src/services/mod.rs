//! Business logic services

pub mod archive_resolver;
pub mod catalog_gateway;
pub mod fetch_cache;
pub mod json_source;
pub mod playback;
pub mod question_synth;
pub mod quiz_controller;
pub mod upstream;

pub use archive_resolver::{parse_track_number, ArchiveResolver, AudioQuiz, Rejection};
pub use catalog_gateway::{CatalogGateway, SourceFailure};
pub use fetch_cache::SharedFetch;
pub use json_source::{FetchError, HttpJsonSource, JsonSource};
pub use playback::{
    AudioElement, ClipWindow, HeadlessAudio, IntervalTicks, ManualTicks, PlaybackController,
    PlaybackDriver, PlaybackError, PlaybackSnapshot, ReplayOutcome, TickSource,
};
pub use question_synth::{
    assemble_trivia_questions, build_trivia_questions, clean_live_title,
    synthesize_audio_questions, synthesize_trivia_question, TargetArtist,
};
pub use quiz_controller::{QuestionView, QuizController, QuizSnapshot};
