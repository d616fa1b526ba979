//! Question synthesis
//!
//! Pure functions from catalog data (plus an injected random source) to
//! quiz questions. Trivia questions are drawn one at a time from a weighted
//! category roll; audio questions come from the tracks of one resolved show.

use gizz_common::config::CatalogConfig;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::collections::HashSet;

use crate::error::QuizError;
use crate::models::{
    AlbumIndex, ArchiveManifest, AudioQuestion, Track, TriviaKind, TriviaQuestion,
};

/// Questions per session
pub const TARGET_QUESTION_COUNT: usize = 10;

/// Fewer trivia questions than this and the session does not start
pub const MIN_QUESTION_COUNT: usize = 5;

/// Draw budget for trivia assembly
pub const MAX_ASSEMBLY_ATTEMPTS: usize = 400;

/// Eligible catalog tracks required before trivia is attempted
pub const MIN_CATALOG_TRACKS: usize = 20;

/// Wrong choices per question
pub const DISTRACTOR_COUNT: usize = 3;

/// Label for the cover answer in original-or-cover questions
pub const COVER_LABEL: &str = "Cover";

/// Trailing "(Live ...)" / "[Live ...]" qualifier added by archive uploads
static LIVE_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*(?:\(\s*live\b[^()]*\)|\[\s*live\b[^\[\]]*\])\s*$")
        .expect("valid live suffix regex")
});

/// The act the catalog is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetArtist {
    /// Canonical name as credited in `original_artist`
    pub name: String,
    /// Name used in prompts and labels
    pub short_name: String,
}

impl TargetArtist {
    pub fn original_label(&self) -> String {
        format!("{} Original", self.short_name)
    }
}

impl From<&CatalogConfig> for TargetArtist {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            name: config.artist_name.clone(),
            short_name: config.artist_short_name.clone(),
        }
    }
}

/// Strip a trailing live qualifier: `"Rattlesnake (Live in Paris '23)"` → `"Rattlesnake"`
///
/// Idempotent; titles without a qualifier come back trimmed but otherwise
/// unchanged. The qualifier must not contain its own brackets, so a nested
/// one such as `"(Live (Encore))"` is kept as written.
pub fn clean_live_title(title: &str) -> String {
    let mut cleaned = title.trim().to_string();
    loop {
        let stripped = LIVE_SUFFIX_RE.replace(&cleaned, "").trim().to_string();
        if stripped == cleaned || stripped.is_empty() {
            return cleaned;
        }
        cleaned = stripped;
    }
}

/// Draw one trivia question
///
/// Returns None when the catalog cannot support distractors (fewer than
/// four albums or tracks, or no alternative year). The caller draws again.
pub fn synthesize_trivia_question<R: Rng + ?Sized>(
    tracks: &[Track],
    albums: &AlbumIndex,
    artist: &TargetArtist,
    rng: &mut R,
) -> Option<TriviaQuestion> {
    if albums.len() < 4 || tracks.len() < 4 {
        return None;
    }

    // 50% album, 30% year, 20% original/cover
    let roll: f64 = rng.gen();
    if roll < 0.5 {
        album_of_song(tracks, albums, rng)
    } else if roll < 0.8 {
        year_question(albums, rng)
    } else {
        original_or_cover(tracks, artist, rng)
    }
}

fn album_of_song<R: Rng + ?Sized>(
    tracks: &[Track],
    albums: &AlbumIndex,
    rng: &mut R,
) -> Option<TriviaQuestion> {
    let track = tracks.choose(rng)?;
    let correct = track.album_title.clone();
    if track.song_name.is_empty() || albums.get(&correct).is_none() {
        return None;
    }

    let others: Vec<&String> = albums.titles().filter(|t| **t != correct).collect();
    let wrongs: Vec<String> = others
        .choose_multiple(rng, DISTRACTOR_COUNT)
        .map(|t| (*t).clone())
        .collect();
    if wrongs.is_empty() {
        return None;
    }

    Some(TriviaQuestion {
        kind: TriviaKind::AlbumOfSong,
        prompt: format!("Which album features the song \"{}\"?", track.song_name),
        choices: shuffled_choices(&correct, wrongs, rng),
        correct_answer: correct,
        explanation: None,
    })
}

fn year_question<R: Rng + ?Sized>(albums: &AlbumIndex, rng: &mut R) -> Option<TriviaQuestion> {
    let entries: Vec<_> = albums.iter().collect();
    let (title, entry) = entries.choose(rng)?;
    let correct = entry.release_year.clone();

    let other_years: Vec<String> = albums
        .distinct_years()
        .into_iter()
        .filter(|y| *y != correct)
        .collect();
    let wrongs: Vec<String> = other_years
        .choose_multiple(rng, DISTRACTOR_COUNT)
        .cloned()
        .collect();
    if wrongs.is_empty() {
        return None;
    }

    Some(TriviaQuestion {
        kind: TriviaKind::ReleaseYear,
        prompt: format!("What year was \"{}\" released?", title),
        choices: shuffled_choices(&correct, wrongs, rng),
        correct_answer: correct,
        explanation: None,
    })
}

fn original_or_cover<R: Rng + ?Sized>(
    tracks: &[Track],
    artist: &TargetArtist,
    rng: &mut R,
) -> Option<TriviaQuestion> {
    let track = tracks.choose(rng)?;
    if track.song_name.is_empty() {
        return None;
    }
    let is_original = track.original_artist.is_empty() || track.original_artist == artist.name;
    let original_label = artist.original_label();

    let (correct, explanation) = if is_original {
        (original_label.clone(), None)
    } else {
        (
            COVER_LABEL.to_string(),
            Some(format!("Originally by {}", track.original_artist)),
        )
    };

    Some(TriviaQuestion {
        kind: TriviaKind::OriginalOrCover,
        prompt: format!(
            "Is \"{}\" a {} original or a cover?",
            track.song_name, artist.short_name
        ),
        correct_answer: correct,
        choices: vec![original_label, COVER_LABEL.to_string()],
        explanation,
    })
}

fn shuffled_choices<R: Rng + ?Sized>(correct: &str, wrongs: Vec<String>, rng: &mut R) -> Vec<String> {
    let mut choices = Vec::with_capacity(wrongs.len() + 1);
    choices.push(correct.to_string());
    choices.extend(wrongs);
    choices.shuffle(rng);
    choices
}

/// Collect up to [`TARGET_QUESTION_COUNT`] trivia questions with distinct prompts
///
/// Gives up after [`MAX_ASSEMBLY_ATTEMPTS`] draws; fewer than
/// [`MIN_QUESTION_COUNT`] questions is an error.
pub fn assemble_trivia_questions<R: Rng + ?Sized>(
    tracks: &[Track],
    albums: &AlbumIndex,
    artist: &TargetArtist,
    rng: &mut R,
) -> Result<Vec<TriviaQuestion>, QuizError> {
    let mut questions = Vec::with_capacity(TARGET_QUESTION_COUNT);
    let mut seen_prompts = HashSet::new();
    let mut attempts = 0;

    while questions.len() < TARGET_QUESTION_COUNT && attempts < MAX_ASSEMBLY_ATTEMPTS {
        if let Some(question) = synthesize_trivia_question(tracks, albums, artist, rng) {
            if seen_prompts.insert(question.prompt.clone()) {
                questions.push(question);
            }
        }
        attempts += 1;
    }

    tracing::debug!(
        questions = questions.len(),
        attempts = attempts,
        "Trivia assembly finished"
    );

    if questions.len() < MIN_QUESTION_COUNT {
        return Err(QuizError::InsufficientQuestions);
    }
    Ok(questions)
}

/// Catalog floor check, album index build and assembly in one step
pub fn build_trivia_questions<R: Rng + ?Sized>(
    tracks: &[Track],
    artist: &TargetArtist,
    rng: &mut R,
) -> Result<Vec<TriviaQuestion>, QuizError> {
    if tracks.len() < MIN_CATALOG_TRACKS {
        return Err(QuizError::InsufficientCatalogData);
    }
    let albums = AlbumIndex::from_tracks(tracks);
    assemble_trivia_questions(tracks, &albums, artist, rng)
}

/// One audio question per randomly chosen distinct track (up to ten)
///
/// Distractors are other titles from the same show. A track whose title
/// has no distinct alternative in the show is skipped.
pub fn synthesize_audio_questions<R: Rng + ?Sized>(
    manifest: &ArchiveManifest,
    rng: &mut R,
) -> Vec<AudioQuestion> {
    let cleaned: Vec<String> = manifest
        .tracks
        .iter()
        .map(|t| clean_live_title(&t.title))
        .collect();

    let picks: Vec<usize> = (0..manifest.tracks.len())
        .collect::<Vec<_>>()
        .choose_multiple(rng, TARGET_QUESTION_COUNT)
        .copied()
        .collect();

    let mut questions = Vec::with_capacity(picks.len());
    for index in picks {
        let correct = &cleaned[index];

        let mut pool: Vec<&String> = Vec::new();
        for title in &cleaned {
            if title != correct && !pool.contains(&title) {
                pool.push(title);
            }
        }
        let wrongs: Vec<String> = pool
            .choose_multiple(rng, DISTRACTOR_COUNT)
            .map(|t| (*t).clone())
            .collect();
        if wrongs.is_empty() {
            continue;
        }

        questions.push(AudioQuestion {
            audio_url: manifest.tracks[index].audio_url.clone(),
            correct_title: correct.clone(),
            choices: shuffled_choices(correct, wrongs, rng),
        });
    }
    questions
}
