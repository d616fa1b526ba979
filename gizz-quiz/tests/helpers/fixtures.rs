//! Catalog and archive fixtures

use gizz_common::config::TomlConfig;
use gizz_quiz::services::ManualTicks;
use gizz_quiz::{build_engine, AppState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::sync::Arc;

use super::FakeJsonSource;

pub const CATALOG_BASE: &str = "https://catalog.test/api/v2";
pub const METADATA_BASE: &str = "https://archive.test/metadata";
pub const DOWNLOAD_BASE: &str = "https://archive.test/download";

pub fn test_config() -> TomlConfig {
    let mut config = TomlConfig::default();
    config.catalog.base_url = CATALOG_BASE.to_string();
    config.archive.metadata_base_url = METADATA_BASE.to_string();
    config.archive.download_base_url = DOWNLOAD_BASE.to_string();
    config
}

pub fn albums_url(config: &TomlConfig) -> String {
    format!(
        "{}/albums.json?limit={}",
        config.catalog.base_url, config.catalog.album_limit
    )
}

pub fn uploads_url(config: &TomlConfig) -> String {
    format!("{}/uploads.json", config.catalog.base_url)
}

pub fn links_url(config: &TomlConfig) -> String {
    format!(
        "{}/links.json?order_by=link_id&direction=desc&limit={}",
        config.catalog.base_url, config.catalog.recent_link_limit
    )
}

pub fn metadata_url(identifier: &str) -> String {
    format!("{}/{}", METADATA_BASE, identifier)
}

fn envelope(data: Vec<Value>) -> Value {
    json!({ "error": false, "error_message": "", "data": data })
}

/// 25 eligible studio tracks over 6 albums, plus rows that must be filtered
///
/// Includes one live row, one row of another artist and one malformed row.
pub fn catalog_doc() -> Value {
    let albums = [
        ("Flight b741", "2024-08-09"),
        ("PetroDragonic Apocalypse", "2023-06-16"),
        ("Omnium Gatherum", "2022-04-22"),
        ("Butterfly 3000", "2021-06-11"),
        ("K.G.", "2020-11-20"),
        ("Infest the Rats' Nest", "2019-08-16"),
    ];

    let mut rows = vec![json!({
        "album_title": "Flight b741", "artist_id": 1, "releasedate": "2024-08-09",
        "song_name": "Road Train", "original_artist": "", "islive": 0
    })];
    for i in 1..25 {
        let (album, date) = albums[i % albums.len()];
        let original = if i % 8 == 0 { "Tame Impala" } else { "" };
        rows.push(json!({
            "album_title": album, "artist_id": 1, "releasedate": date,
            "song_name": format!("Song {}", i), "original_artist": original, "islive": 0
        }));
    }
    rows.push(json!({
        "album_title": "Live in Adelaide '19", "artist_id": 1, "releasedate": "2020-01-01",
        "song_name": "Live Only", "original_artist": "", "islive": 1
    }));
    rows.push(json!({
        "album_title": "Someone Else", "artist_id": 2, "releasedate": "2010-01-01",
        "song_name": "Not Ours", "original_artist": "", "islive": 0
    }));
    rows.push(json!({ "album_title": "Broken Row", "artist_id": {"id": 1} }));

    envelope(rows)
}

pub fn uploads_doc() -> Value {
    envelope(vec![
        json!({"show_id": 123, "URL": "https://img.test/123-flyer.jpg", "upload_type": "flyer"}),
        json!({"show_id": "123", "URL": "https://img.test/123-poster.jpg", "upload_type": "poster-art"}),
        json!({"show_id": "456", "URL": "https://img.test/456-poster.jpg", "upload_type": "poster-art"}),
        json!({"show_id": "", "URL": "https://img.test/orphan.jpg", "upload_type": "poster-art"}),
    ])
}

/// Show links; `(show_id, archive identifier or None for a video link)`
pub fn links_doc(links: &[(&str, Option<&str>)]) -> Value {
    envelope(
        links
            .iter()
            .map(|(show_id, identifier)| match identifier {
                Some(id) => json!({
                    "show_id": show_id,
                    "url": format!("https://archive.org/embed/{}?playlist=1", id)
                }),
                None => json!({
                    "show_id": show_id,
                    "url": format!("https://youtube.test/watch?v={}", show_id)
                }),
            })
            .collect(),
    )
}

/// Archive metadata with `tracks` playable files plus non-playable noise
pub fn metadata_doc(tracks: usize) -> Value {
    let titles = [
        "Rattlesnake (Live in Paris '23)",
        "Gamma Knife",
        "People-Vultures",
        "The River [Live]",
        "Robot Stop",
        "Hot Water",
        "Sleep Drifter",
        "Crumbling Castle",
        "Mars for the Rich",
        "Hypertension",
        "Magenta Mountain",
        "Iron Lung",
    ];
    let mut files: Vec<Value> = (0..tracks)
        .rev()
        .map(|i| {
            json!({
                "name": format!("kglw-t{:02}.mp3", i + 1),
                "title": titles[i % titles.len()],
                "track": format!("{}/{}", i + 1, tracks),
                "format": "VBR MP3"
            })
        })
        .collect();
    files.push(json!({"name": "kglw-t01.flac", "title": "Rattlesnake", "track": "1", "format": "Flac"}));
    files.push(json!({"name": "cover.jpg", "format": "JPEG"}));
    json!({ "files": files })
}

/// Serve catalog, uploads and the given links from `source`
pub fn wire_catalog(source: &FakeJsonSource, config: &TomlConfig, links: &[(&str, Option<&str>)]) {
    source.serve(albums_url(config), catalog_doc());
    source.serve(uploads_url(config), uploads_doc());
    source.serve(links_url(config), links_doc(links));
}

/// Engine with fresh caches, manual clip ticks and a fixed seed
pub fn test_engine(
    source: Arc<FakeJsonSource>,
    config: &TomlConfig,
    seed: u64,
) -> (AppState, Arc<ManualTicks>) {
    let ticks = Arc::new(ManualTicks::new());
    let state = build_engine(config, source, ticks.clone(), StdRng::seed_from_u64(seed));
    (state, ticks)
}
