//! Archive resolver
//!
//! Turns a show link into a playable track list by reading the archive's
//! metadata document, and builds the audio quiz by trying recent shows one
//! at a time until one yields a usable manifest.

use gizz_common::config::ArchiveConfig;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::catalog_gateway::CatalogGateway;
use super::json_source::{FetchError, JsonSource};
use super::question_synth::synthesize_audio_questions;
use super::upstream::lenient_string;
use crate::error::QuizError;
use crate::models::{ArchiveManifest, AudioQuestion, ManifestTrack, ShowLink};

/// Why a show could not be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("link is not an archival embed: {0}")]
    NotArchiveLink(String),

    #[error("metadata fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("only {found} playable tracks, need {required}")]
    TooFewTracks { found: usize, required: usize },

    #[error("cannot build download URL: {0}")]
    BadDownloadUrl(String),
}

/// Audio questions plus the poster of the show they came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioQuiz {
    pub questions: Vec<AudioQuestion>,
    pub poster_url: Option<String>,
    pub identifier: String,
}

#[derive(Debug, Deserialize)]
struct MetadataDoc {
    #[serde(default)]
    files: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ArchiveFile {
    #[serde(default, deserialize_with = "lenient_string")]
    format: String,
    #[serde(default, deserialize_with = "lenient_string")]
    title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    track: String,
    #[serde(default, deserialize_with = "lenient_string")]
    name: String,
}

/// Leading integer of an archive track field: `"3/12"` → 3, `"07"` → 7
pub fn parse_track_number(track: &str) -> Option<u32> {
    let digits: String = track
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

pub struct ArchiveResolver {
    source: Arc<dyn JsonSource>,
    config: ArchiveConfig,
}

impl ArchiveResolver {
    pub fn new(source: Arc<dyn JsonSource>, config: ArchiveConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Resolve a show to its playable tracks, or explain why it is unusable
    pub async fn try_resolve(&self, link: &ShowLink) -> Result<ArchiveManifest, Rejection> {
        let identifier = link
            .archive_identifier()
            .ok_or_else(|| Rejection::NotArchiveLink(link.url.clone()))?;

        let url = format!(
            "{}/{}",
            self.config.metadata_base_url.trim_end_matches('/'),
            identifier
        );
        let doc = self.source.get_json(&url).await?;
        self.manifest_from_metadata(identifier, &link.show_id, doc)
    }

    /// [`try_resolve`](Self::try_resolve) with the reason logged and dropped
    pub async fn resolve_show_to_manifest(&self, link: &ShowLink) -> Option<ArchiveManifest> {
        match self.try_resolve(link).await {
            Ok(manifest) => Some(manifest),
            Err(reason) => {
                warn!(show_id = %link.show_id, reason = %reason, "Show rejected");
                None
            }
        }
    }

    /// Filter to playable titled files, sort by track number, require the
    /// minimum track count
    pub fn manifest_from_metadata(
        &self,
        identifier: &str,
        show_id: &str,
        doc: Value,
    ) -> Result<ArchiveManifest, Rejection> {
        let metadata: MetadataDoc = serde_json::from_value(doc)
            .map_err(|e| FetchError::Schema(format!("unexpected metadata document: {}", e)))?;

        let mut files: Vec<ArchiveFile> = metadata
            .files
            .into_iter()
            .filter_map(|value| serde_json::from_value::<ArchiveFile>(value).ok())
            .filter(|f| {
                f.format == self.config.playable_format
                    && !f.title.trim().is_empty()
                    && !f.name.is_empty()
            })
            .collect();

        if files.len() < self.config.min_tracks {
            return Err(Rejection::TooFewTracks {
                found: files.len(),
                required: self.config.min_tracks,
            });
        }

        // Missing track numbers sort last; ties keep document order
        files.sort_by_key(|f| match parse_track_number(&f.track) {
            Some(n) => (false, n),
            None => (true, 0),
        });

        let mut tracks = Vec::with_capacity(files.len());
        for file in files {
            tracks.push(ManifestTrack {
                audio_url: self.download_url(identifier, &file.name)?,
                title: file.title.trim().to_string(),
                track_number: parse_track_number(&file.track),
            });
        }

        Ok(ArchiveManifest {
            identifier: identifier.to_string(),
            show_id: show_id.to_string(),
            tracks,
        })
    }

    fn download_url(&self, identifier: &str, file_name: &str) -> Result<String, Rejection> {
        let mut url = Url::parse(&self.config.download_base_url)
            .map_err(|e| Rejection::BadDownloadUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| Rejection::BadDownloadUrl(self.config.download_base_url.clone()))?
            .pop_if_empty()
            .push(identifier)
            .extend(file_name.split('/'));
        Ok(url.to_string())
    }

    /// Build an audio quiz from one of the most recent archival shows
    ///
    /// Up to `candidate_count` shuffled archival links are resolved strictly
    /// one after another; the first usable show wins.
    pub async fn build_audio_quiz_from_recent_shows<R: Rng + Send + ?Sized>(
        &self,
        gateway: &CatalogGateway,
        rng: &mut R,
    ) -> Result<AudioQuiz, QuizError> {
        let limit = gateway.config().recent_link_limit as usize;
        let mut candidates: Vec<ShowLink> = gateway
            .fetch_recent_show_links(limit)
            .await
            .into_iter()
            .filter(ShowLink::is_archive_embed)
            .collect();

        if candidates.is_empty() {
            return Err(QuizError::NoArchivalRecordings);
        }

        candidates.shuffle(rng);
        candidates.truncate(self.config.candidate_count);
        debug!(candidates = candidates.len(), "Resolving archival candidates");

        for (attempt, link) in candidates.iter().enumerate() {
            let Some(manifest) = self.resolve_show_to_manifest(link).await else {
                continue;
            };

            let questions = synthesize_audio_questions(&manifest, rng);
            if questions.is_empty() {
                warn!(identifier = %manifest.identifier, "Show has no distinguishable titles");
                continue;
            }

            let poster_url = gateway
                .fetch_upload_index()
                .await
                .get(&link.show_id)
                .map(str::to_string);

            info!(
                identifier = %manifest.identifier,
                attempt = attempt + 1,
                tracks = manifest.len(),
                questions = questions.len(),
                "Audio quiz built"
            );
            return Ok(AudioQuiz {
                questions,
                poster_url,
                identifier: manifest.identifier,
            });
        }

        Err(QuizError::AudioTracksUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct NoNetwork;

    #[async_trait]
    impl JsonSource for NoNetwork {
        async fn get_json(&self, _url: &str) -> Result<Value, FetchError> {
            Err(FetchError::Network("offline".to_string()))
        }
    }

    fn resolver() -> ArchiveResolver {
        ArchiveResolver::new(Arc::new(NoNetwork), ArchiveConfig::default())
    }

    fn mp3(name: &str, title: &str, track: &str) -> Value {
        json!({"name": name, "title": title, "track": track, "format": "VBR MP3"})
    }

    #[test]
    fn test_parse_track_number() {
        assert_eq!(parse_track_number("3/12"), Some(3));
        assert_eq!(parse_track_number("07"), Some(7));
        assert_eq!(parse_track_number(" 11 "), Some(11));
        assert_eq!(parse_track_number(""), None);
        assert_eq!(parse_track_number("A1"), None);
    }

    #[test]
    fn test_manifest_filters_and_sorts() {
        let doc = json!({
            "files": [
                mp3("s1t03.mp3", "Gamma Knife", "3"),
                mp3("s1t01.mp3", "Robot Stop", "1/8"),
                mp3("encore.mp3", "Hot Water (Live)", ""),
                mp3("s1t02.mp3", "Big Fig Wasp", "02"),
                {"name": "s1t01.flac", "title": "Robot Stop", "track": "1", "format": "Flac"},
                mp3("untitled.mp3", "", "9"),
                mp3("s1t05.mp3", "People-Vultures", "5"),
                mp3("s1t04.mp3", "Wah Wah", "4"),
                mp3("s1t06.mp3", "Road Train", "6"),
            ]
        });

        let manifest = resolver()
            .manifest_from_metadata("kglw2016-10-01", "42", doc)
            .unwrap();
        let titles: Vec<&str> = manifest.tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Robot Stop",
                "Big Fig Wasp",
                "Gamma Knife",
                "Wah Wah",
                "People-Vultures",
                "Road Train",
                "Hot Water (Live)"
            ]
        );
        assert_eq!(manifest.tracks.last().unwrap().track_number, None);
        assert_eq!(
            manifest.tracks[0].audio_url,
            "https://archive.org/download/kglw2016-10-01/s1t01.mp3"
        );
    }

    #[test]
    fn test_manifest_rejects_five_tracks() {
        let files: Vec<Value> = (1..=5)
            .map(|i| mp3(&format!("t{}.mp3", i), &format!("Song {}", i), &i.to_string()))
            .collect();
        let err = resolver()
            .manifest_from_metadata("id", "1", json!({ "files": files }))
            .unwrap_err();
        assert_eq!(err, Rejection::TooFewTracks { found: 5, required: 6 });
    }

    #[test]
    fn test_manifest_missing_files_is_too_few() {
        let err = resolver()
            .manifest_from_metadata("gone", "1", json!({}))
            .unwrap_err();
        assert_eq!(err, Rejection::TooFewTracks { found: 0, required: 6 });
    }

    #[test]
    fn test_download_url_encodes_segments() {
        let url = resolver()
            .download_url("kglw 2023", "Disc 1/01 Rattlesnake #1.mp3")
            .unwrap();
        assert_eq!(
            url,
            "https://archive.org/download/kglw%202023/Disc%201/01%20Rattlesnake%20%231.mp3"
        );
    }

    #[tokio::test]
    async fn test_non_archive_link_is_rejected_without_fetch() {
        let link = ShowLink {
            show_id: "7".to_string(),
            url: "https://youtube.com/watch?v=abc".to_string(),
        };
        let err = resolver().try_resolve(&link).await.unwrap_err();
        assert!(matches!(err, Rejection::NotArchiveLink(_)));
        assert!(resolver().resolve_show_to_manifest(&link).await.is_none());
    }
}
