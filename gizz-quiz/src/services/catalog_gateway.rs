//! Remote data gateway
//!
//! Fetches and normalizes the three catalog sources:
//! - album/track listing → `Vec<Track>` (target artist, studio only)
//! - upload listing → `UploadIndex`
//! - show-link listing → `Vec<ShowLink>` (most recent first)
//!
//! Each source is memoized in its own [`SharedFetch`]. Failures are absorbed
//! here: callers of the `fetch_*` methods get an empty result and the
//! classified error is kept for diagnostics. The `try_fetch_*` variants
//! expose the classification to callers that want it.

use gizz_common::config::CatalogConfig;
use std::sync::Arc;
use tracing::{info, warn};

use super::fetch_cache::SharedFetch;
use super::json_source::{FetchError, JsonSource};
use super::upstream::{check_envelope, AlbumTrackRecord, LinkRecord, UploadRecord};
use crate::models::{ShowLink, Track, UploadIndex};

/// Catalog repository with per-source single-flight caches
///
/// Constructed once per process (or once per test) and shared by `Arc`.
pub struct CatalogGateway {
    source: Arc<dyn JsonSource>,
    config: CatalogConfig,
    catalog: SharedFetch<Vec<Track>>,
    uploads: SharedFetch<UploadIndex>,
    show_links: SharedFetch<Vec<ShowLink>>,
}

/// Most recent absorbed failure of one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: &'static str,
    pub error: FetchError,
}

impl CatalogGateway {
    pub fn new(source: Arc<dyn JsonSource>, config: CatalogConfig) -> Self {
        Self {
            source,
            config,
            catalog: SharedFetch::new("catalog"),
            uploads: SharedFetch::new("uploads"),
            show_links: SharedFetch::new("show_links"),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    fn albums_url(&self) -> String {
        format!("{}/albums.json?limit={}", self.config.base_url, self.config.album_limit)
    }

    fn uploads_url(&self) -> String {
        format!("{}/uploads.json", self.config.base_url)
    }

    fn links_url(&self) -> String {
        format!(
            "{}/links.json?order_by=link_id&direction=desc&limit={}",
            self.config.base_url, self.config.recent_link_limit
        )
    }

    /// Studio tracks of the target artist
    pub async fn try_fetch_catalog(&self) -> Result<Arc<Vec<Track>>, FetchError> {
        let source = Arc::clone(&self.source);
        let url = self.albums_url();
        let artist_id = self.config.artist_id;

        self.catalog
            .get_or_fetch(move || async move {
                let doc = source.get_json(&url).await?;
                let records = check_envelope::<AlbumTrackRecord>(doc)?.into_valid("catalog");
                let total = records.len();
                let tracks: Vec<Track> = records
                    .into_iter()
                    .filter(|r| r.artist_id == artist_id && !r.islive)
                    .map(|r| Track {
                        album_title: r.album_title,
                        release_date: r.releasedate,
                        song_name: r.song_name,
                        original_artist: r.original_artist,
                        is_live: r.islive,
                    })
                    .collect();
                info!(
                    records = total,
                    eligible = tracks.len(),
                    "Catalog loaded"
                );
                Ok(tracks)
            })
            .await
    }

    /// Show id → representative image URL
    pub async fn try_fetch_upload_index(&self) -> Result<Arc<UploadIndex>, FetchError> {
        let source = Arc::clone(&self.source);
        let url = self.uploads_url();

        self.uploads
            .get_or_fetch(move || async move {
                let doc = source.get_json(&url).await?;
                let records = check_envelope::<UploadRecord>(doc)?.into_valid("uploads");
                let mut index = UploadIndex::new();
                for record in &records {
                    index.insert(&record.show_id, &record.url, &record.upload_type);
                }
                info!(records = records.len(), shows = index.len(), "Upload index loaded");
                Ok(index)
            })
            .await
    }

    /// Most recent show links, newest first, at most `limit`
    ///
    /// The listing is fetched once with the configured limit; smaller limits
    /// are served as a prefix of the cached list.
    pub async fn try_fetch_recent_show_links(
        &self,
        limit: usize,
    ) -> Result<Vec<ShowLink>, FetchError> {
        let source = Arc::clone(&self.source);
        let url = self.links_url();

        let links = self
            .show_links
            .get_or_fetch(move || async move {
                let doc = source.get_json(&url).await?;
                let links: Vec<ShowLink> = check_envelope::<LinkRecord>(doc)?
                    .into_valid("show_links")
                    .into_iter()
                    .filter(|r| !r.url.is_empty())
                    .map(|r| ShowLink {
                        show_id: r.show_id,
                        url: r.url,
                    })
                    .collect();
                info!(links = links.len(), "Show links loaded");
                Ok(links)
            })
            .await?;

        Ok(links.iter().take(limit).cloned().collect())
    }

    /// Studio tracks, or empty on failure
    pub async fn fetch_catalog(&self) -> Arc<Vec<Track>> {
        match self.try_fetch_catalog().await {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!(error = %e, "Catalog unavailable, continuing with empty catalog");
                Arc::new(Vec::new())
            }
        }
    }

    /// Upload index, or empty on failure
    pub async fn fetch_upload_index(&self) -> Arc<UploadIndex> {
        match self.try_fetch_upload_index().await {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "Upload index unavailable, continuing without posters");
                Arc::new(UploadIndex::new())
            }
        }
    }

    /// Recent show links, or empty on failure
    pub async fn fetch_recent_show_links(&self, limit: usize) -> Vec<ShowLink> {
        match self.try_fetch_recent_show_links(limit).await {
            Ok(links) => links,
            Err(e) => {
                warn!(error = %e, "Show links unavailable, continuing without recordings");
                Vec::new()
            }
        }
    }

    /// Last absorbed failure per source
    pub async fn source_failures(&self) -> Vec<SourceFailure> {
        let mut failures = Vec::new();
        if let Some(error) = self.catalog.last_error().await {
            failures.push(SourceFailure { source: self.catalog.name(), error });
        }
        if let Some(error) = self.uploads.last_error().await {
            failures.push(SourceFailure { source: self.uploads.name(), error });
        }
        if let Some(error) = self.show_links.last_error().await {
            failures.push(SourceFailure { source: self.show_links.name(), error });
        }
        failures
    }
}
