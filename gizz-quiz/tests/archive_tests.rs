//! Archive resolver tests: manifest acceptance and candidate fallback

mod helpers;

use gizz_quiz::services::{ArchiveResolver, CatalogGateway, FetchError, Rejection};
use gizz_quiz::models::ShowLink;
use gizz_quiz::QuizError;
use helpers::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;

fn parts(source: &Arc<FakeJsonSource>) -> (CatalogGateway, ArchiveResolver) {
    let config = test_config();
    (
        CatalogGateway::new(source.clone(), config.catalog.clone()),
        ArchiveResolver::new(source.clone(), config.archive),
    )
}

fn link(show_id: &str, identifier: &str) -> ShowLink {
    ShowLink {
        show_id: show_id.to_string(),
        url: format!("https://archive.org/embed/{}", identifier),
    }
}

#[tokio::test]
async fn resolves_manifest_in_track_order() {
    let source = Arc::new(FakeJsonSource::new());
    source.serve(metadata_url("kglw2023-06-08"), metadata_doc(8));
    let (_, resolver) = parts(&source);

    let manifest = resolver
        .resolve_show_to_manifest(&link("9", "kglw2023-06-08"))
        .await
        .unwrap();

    assert_eq!(manifest.len(), 8);
    assert_eq!(manifest.show_id, "9");
    let numbers: Vec<Option<u32>> = manifest.tracks.iter().map(|t| t.track_number).collect();
    assert_eq!(numbers, (1..=8).map(Some).collect::<Vec<_>>());
    assert_eq!(
        manifest.tracks[0].audio_url,
        "https://archive.test/download/kglw2023-06-08/kglw-t01.mp3"
    );
}

#[tokio::test]
async fn rejects_show_with_five_tracks() {
    let source = Arc::new(FakeJsonSource::new());
    source.serve(metadata_url("short-set"), metadata_doc(5));
    let (_, resolver) = parts(&source);

    let err = resolver.try_resolve(&link("1", "short-set")).await.unwrap_err();
    assert_eq!(err, Rejection::TooFewTracks { found: 5, required: 6 });
}

#[tokio::test]
async fn fetch_failure_rejects_show() {
    let source = Arc::new(FakeJsonSource::new());
    source.fail(metadata_url("gone"), FetchError::Network("reset".to_string()));
    let (_, resolver) = parts(&source);

    assert!(resolver.resolve_show_to_manifest(&link("1", "gone")).await.is_none());
}

#[tokio::test]
async fn falls_back_past_bad_candidates() {
    let config = test_config();
    let source = Arc::new(FakeJsonSource::new());
    wire_catalog(
        &source,
        &config,
        &[
            ("100", Some("removed-show")),
            ("123", Some("kglw-good")),
            ("101", Some("tiny-show")),
            ("102", None),
        ],
    );
    source.fail(metadata_url("removed-show"), FetchError::Status(404));
    source.serve(metadata_url("tiny-show"), metadata_doc(3));
    source.serve(metadata_url("kglw-good"), metadata_doc(6));
    let (gateway, resolver) = parts(&source);

    let mut rng = StdRng::seed_from_u64(17);
    let quiz = resolver
        .build_audio_quiz_from_recent_shows(&gateway, &mut rng)
        .await
        .unwrap();

    assert_eq!(quiz.identifier, "kglw-good");
    assert_eq!(quiz.poster_url.as_deref(), Some("https://img.test/123-poster.jpg"));
    assert_eq!(quiz.questions.len(), 6);

    let titles: HashSet<&str> = quiz.questions.iter().map(|q| q.correct_title.as_str()).collect();
    assert!(titles.contains("Rattlesnake"));
    assert!(titles.contains("The River"));
    assert_eq!(source.calls(&metadata_url("kglw-good")), 1);
}

#[tokio::test]
async fn no_archive_links_is_reported() {
    let config = test_config();
    let source = Arc::new(FakeJsonSource::new());
    wire_catalog(&source, &config, &[("1", None), ("2", None)]);
    let (gateway, resolver) = parts(&source);

    let mut rng = StdRng::seed_from_u64(1);
    let err = resolver
        .build_audio_quiz_from_recent_shows(&gateway, &mut rng)
        .await
        .unwrap_err();
    assert_eq!(err, QuizError::NoArchivalRecordings);
}

#[tokio::test]
async fn all_candidates_failing_is_reported() {
    let config = test_config();
    let source = Arc::new(FakeJsonSource::new());
    let links: Vec<(String, String)> = (0..9)
        .map(|i| (i.to_string(), format!("bad-{}", i)))
        .collect();
    let refs: Vec<(&str, Option<&str>)> = links
        .iter()
        .map(|(s, id)| (s.as_str(), Some(id.as_str())))
        .collect();
    wire_catalog(&source, &config, &refs);
    let (gateway, resolver) = parts(&source);

    let mut rng = StdRng::seed_from_u64(5);
    let err = resolver
        .build_audio_quiz_from_recent_shows(&gateway, &mut rng)
        .await
        .unwrap_err();
    assert_eq!(err, QuizError::AudioTracksUnavailable);

    let attempted: usize = (0..9).map(|i| source.calls(&metadata_url(&format!("bad-{}", i)))).sum();
    assert_eq!(attempted, config.archive.candidate_count);
}
