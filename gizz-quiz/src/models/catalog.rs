//! Normalized catalog data
//!
//! Everything here is built by the gateway from validated upstream records
//! and then treated as read-only by the synthesizer.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upload tag that takes precedence when a show has several images
pub const POSTER_ART_TAG: &str = "poster-art";

/// Year shown for albums without a release date
pub const UNKNOWN_YEAR: &str = "Unknown";

/// Known archival embed pattern; capture group 1 is the archive identifier
static ARCHIVE_EMBED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"archive\.org/embed/([A-Za-z0-9._-]+)").expect("valid archive embed regex")
});

/// One studio track of the target artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub album_title: String,
    /// `YYYY-MM-DD` as published by the catalog (may be empty)
    pub release_date: String,
    pub song_name: String,
    /// Credited original artist; empty for originals
    pub original_artist: String,
    pub is_live: bool,
}

/// Album entry in the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumEntry {
    pub release_year: String,
    pub songs: Vec<String>,
}

/// Album title → year and songs, rebuilt once per fetch cycle
///
/// Backed by a BTreeMap so iteration (and therefore seeded sampling) is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlbumIndex {
    albums: BTreeMap<String, AlbumEntry>,
}

impl AlbumIndex {
    /// Build from tracks, skipping entries without album title or song name
    ///
    /// The release year comes from the first track seen for each album.
    pub fn from_tracks(tracks: &[Track]) -> Self {
        let mut albums: BTreeMap<String, AlbumEntry> = BTreeMap::new();
        for track in tracks {
            if track.album_title.is_empty() || track.song_name.is_empty() {
                continue;
            }
            albums
                .entry(track.album_title.clone())
                .or_insert_with(|| AlbumEntry {
                    release_year: release_year(&track.release_date),
                    songs: Vec::new(),
                })
                .songs
                .push(track.song_name.clone());
        }
        Self { albums }
    }

    pub fn len(&self) -> usize {
        self.albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }

    pub fn get(&self, album_title: &str) -> Option<&AlbumEntry> {
        self.albums.get(album_title)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AlbumEntry)> {
        self.albums.iter()
    }

    pub fn titles(&self) -> impl Iterator<Item = &String> {
        self.albums.keys()
    }

    /// Distinct release years across all albums, sorted
    pub fn distinct_years(&self) -> Vec<String> {
        let mut years: Vec<String> = self
            .albums
            .values()
            .map(|a| a.release_year.clone())
            .collect();
        years.sort();
        years.dedup();
        years
    }
}

/// Year portion of a catalog date (`"2017-02-24"` → `"2017"`)
pub fn release_year(date: &str) -> String {
    let year = date.split('-').next().unwrap_or_default().trim();
    if year.is_empty() {
        UNKNOWN_YEAR.to_string()
    } else {
        year.to_string()
    }
}

/// Show id → representative image URL
///
/// Any upload tagged poster art replaces the current image, so the last
/// poster art seen wins. Without poster art the first-seen upload stays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadIndex {
    by_show: BTreeMap<String, String>,
}

impl UploadIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one upload; entries with empty show id or URL are ignored
    pub fn insert(&mut self, show_id: &str, url: &str, upload_type: &str) {
        if show_id.is_empty() || url.is_empty() {
            return;
        }
        if upload_type == POSTER_ART_TAG || !self.by_show.contains_key(show_id) {
            self.by_show.insert(show_id.to_string(), url.to_string());
        }
    }

    pub fn get(&self, show_id: &str) -> Option<&str> {
        self.by_show.get(show_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_show.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_show.is_empty()
    }

    /// All representative image URLs, ordered by show id
    pub fn image_urls(&self) -> Vec<&str> {
        self.by_show.values().map(String::as_str).collect()
    }
}

/// Link from a show to an externally embeddable recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowLink {
    pub show_id: String,
    pub url: String,
}

impl ShowLink {
    /// Archive identifier if the URL matches the archival embed pattern
    pub fn archive_identifier(&self) -> Option<&str> {
        ARCHIVE_EMBED_RE
            .captures(&self.url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    pub fn is_archive_embed(&self) -> bool {
        self.archive_identifier().is_some()
    }
}

/// One playable file of a resolved show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestTrack {
    pub audio_url: String,
    pub title: String,
    pub track_number: Option<u32>,
}

/// Playable tracks of one show, in track order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveManifest {
    pub identifier: String,
    pub show_id: String,
    pub tracks: Vec<ManifestTrack>,
}

impl ArchiveManifest {
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(album: &str, date: &str, song: &str) -> Track {
        Track {
            album_title: album.to_string(),
            release_date: date.to_string(),
            song_name: song.to_string(),
            original_artist: String::new(),
            is_live: false,
        }
    }

    #[test]
    fn test_release_year() {
        assert_eq!(release_year("2017-02-24"), "2017");
        assert_eq!(release_year("2019"), "2019");
        assert_eq!(release_year(""), UNKNOWN_YEAR);
    }

    #[test]
    fn test_album_index_groups_songs_and_skips_blank_entries() {
        let tracks = vec![
            track("Nonagon Infinity", "2016-04-29", "Robot Stop"),
            track("Nonagon Infinity", "2016-04-29", "Gamma Knife"),
            track("Flying Microtonal Banana", "2017-02-24", "Rattlesnake"),
            track("", "2017-02-24", "Orphan"),
            track("Polygondwanaland", "", ""),
        ];

        let index = AlbumIndex::from_tracks(&tracks);
        assert_eq!(index.len(), 2);
        let nonagon = index.get("Nonagon Infinity").unwrap();
        assert_eq!(nonagon.release_year, "2016");
        assert_eq!(nonagon.songs, vec!["Robot Stop", "Gamma Knife"]);
        assert!(index.get("Polygondwanaland").is_none());
        assert_eq!(index.distinct_years(), vec!["2016", "2017"]);
    }

    #[test]
    fn test_upload_index_poster_art_wins_regardless_of_order() {
        let mut flyer_first = UploadIndex::new();
        flyer_first.insert("123", "https://img/flyer.jpg", "flyer");
        flyer_first.insert("123", "https://img/poster.jpg", "poster-art");

        let mut poster_first = UploadIndex::new();
        poster_first.insert("123", "https://img/poster.jpg", "poster-art");
        poster_first.insert("123", "https://img/flyer.jpg", "flyer");

        assert_eq!(flyer_first.get("123"), Some("https://img/poster.jpg"));
        assert_eq!(poster_first.get("123"), Some("https://img/poster.jpg"));
    }

    #[test]
    fn test_upload_index_later_poster_art_replaces_earlier() {
        let mut index = UploadIndex::new();
        index.insert("5", "https://img/first-poster.jpg", "poster-art");
        index.insert("5", "https://img/flyer.jpg", "flyer");
        index.insert("5", "https://img/second-poster.jpg", "poster-art");

        assert_eq!(index.get("5"), Some("https://img/second-poster.jpg"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_upload_index_first_seen_wins_without_poster() {
        let mut index = UploadIndex::new();
        index.insert("9", "https://img/a.jpg", "flyer");
        index.insert("9", "https://img/b.jpg", "photo");
        index.insert("", "https://img/c.jpg", "poster-art");
        index.insert("10", "", "poster-art");

        assert_eq!(index.get("9"), Some("https://img/a.jpg"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_show_link_archive_identifier() {
        let link = ShowLink {
            show_id: "1".to_string(),
            url: "https://archive.org/embed/kglw2023-06-08.sbd?playlist=1".to_string(),
        };
        assert_eq!(link.archive_identifier(), Some("kglw2023-06-08.sbd"));

        let youtube = ShowLink {
            show_id: "2".to_string(),
            url: "https://youtube.com/watch?v=abc".to_string(),
        };
        assert!(!youtube.is_archive_embed());
    }
}
