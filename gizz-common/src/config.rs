//! Bootstrap configuration loading
//!
//! The quiz service reads a single TOML file at startup. Every field has a
//! built-in default, so a missing file or a missing section is never fatal.
//!
//! # Config file resolution priority
//!
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`GIZZ_QUIZ_CONFIG`)
//! 3. Platform config directory (`<config_dir>/gizz-quiz/config.toml`)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "GIZZ_QUIZ_CONFIG";

/// Environment variable overriding the HTTP port
pub const PORT_ENV_VAR: &str = "GIZZ_QUIZ_PORT";

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change while the service runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Remote catalog API and target artist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the catalog API (no trailing slash)
    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,

    /// Numeric artist id of the target act in the catalog
    #[serde(default = "default_artist_id")]
    pub artist_id: i64,

    /// Canonical artist name, as credited in `original_artist`
    #[serde(default = "default_artist_name")]
    pub artist_name: String,

    /// Short name used in prompts and choice labels
    #[serde(default = "default_artist_short_name")]
    pub artist_short_name: String,

    /// `limit` query parameter for the album listing
    #[serde(default = "default_album_limit")]
    pub album_limit: u32,

    /// Number of most recent show links considered for archival audio
    #[serde(default = "default_recent_link_limit")]
    pub recent_link_limit: u32,
}

/// Third-party archive endpoints and acceptance rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_metadata_base_url")]
    pub metadata_base_url: String,

    #[serde(default = "default_download_base_url")]
    pub download_base_url: String,

    /// File format accepted as playable audio
    #[serde(default = "default_playable_format")]
    pub playable_format: String,

    /// Minimum number of playable tracks for a show to be usable
    #[serde(default = "default_min_tracks")]
    pub min_tracks: usize,

    /// Maximum number of shows tried before giving up
    #[serde(default = "default_candidate_count")]
    pub candidate_count: usize,
}

/// Audio clip window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Seek offset into each track before the clip starts
    #[serde(default = "default_clip_start_secs")]
    pub clip_start_secs: u32,

    /// Clip length; playback stops automatically when reached
    #[serde(default = "default_clip_duration_secs")]
    pub clip_duration_secs: u32,
}

/// Outbound HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5740
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_catalog_base_url() -> String {
    "https://kglw.net/api/v2".to_string()
}

fn default_artist_id() -> i64 {
    1
}

fn default_artist_name() -> String {
    "King Gizzard & the Lizard Wizard".to_string()
}

fn default_artist_short_name() -> String {
    "KGLW".to_string()
}

fn default_album_limit() -> u32 {
    2000
}

fn default_recent_link_limit() -> u32 {
    80
}

fn default_metadata_base_url() -> String {
    "https://archive.org/metadata".to_string()
}

fn default_download_base_url() -> String {
    "https://archive.org/download".to_string()
}

fn default_playable_format() -> String {
    "VBR MP3".to_string()
}

fn default_min_tracks() -> usize {
    6
}

fn default_candidate_count() -> usize {
    6
}

fn default_clip_start_secs() -> u32 {
    30
}

fn default_clip_duration_secs() -> u32 {
    30
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("gizz-quiz/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            logging: LoggingConfig::default(),
            catalog: CatalogConfig::default(),
            archive: ArchiveConfig::default(),
            playback: PlaybackConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_base_url(),
            artist_id: default_artist_id(),
            artist_name: default_artist_name(),
            artist_short_name: default_artist_short_name(),
            album_limit: default_album_limit(),
            recent_link_limit: default_recent_link_limit(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            metadata_base_url: default_metadata_base_url(),
            download_base_url: default_download_base_url(),
            playable_format: default_playable_format(),
            min_tracks: default_min_tracks(),
            candidate_count: default_candidate_count(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            clip_start_secs: default_clip_start_secs(),
            clip_duration_secs: default_clip_duration_secs(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl TomlConfig {
    /// Reject values that would make the engine unusable
    pub fn validate(&self) -> Result<()> {
        if self.catalog.base_url.trim().is_empty() {
            return Err(Error::Config("catalog.base_url must not be empty".to_string()));
        }
        if self.archive.min_tracks < 2 {
            return Err(Error::Config(format!(
                "archive.min_tracks must be at least 2, got {}",
                self.archive.min_tracks
            )));
        }
        if self.archive.candidate_count == 0 {
            return Err(Error::Config("archive.candidate_count must be at least 1".to_string()));
        }
        if self.playback.clip_duration_secs == 0 {
            return Err(Error::Config("playback.clip_duration_secs must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Platform default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gizz-quiz").join("config.toml"))
}

/// Pick the config file path following the priority order above
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

/// Load config with graceful degradation
///
/// A missing file logs a warning and yields defaults. A file that exists but
/// cannot be parsed is an error.
pub fn load_or_default(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        warn!("No config directory available on this platform, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file not found at {}, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(path)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TomlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.port, 5740);
        assert_eq!(config.archive.min_tracks, 6);
        assert_eq!(config.playback.clip_duration_secs, 30);
        assert_eq!(config.catalog.artist_short_name, "KGLW");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            port = 8080

            [catalog]
            artist_short_name = "Gizz"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.catalog.artist_short_name, "Gizz");
        assert_eq!(config.catalog.artist_id, 1);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.archive.playable_format, "VBR MP3");
    }

    #[test]
    fn test_validate_rejects_zero_clip() {
        let mut config = TomlConfig::default();
        config.playback.clip_duration_secs = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_path_wins() {
        let path = PathBuf::from("/tmp/explicit.toml");
        assert_eq!(resolve_config_path(Some(&path)), Some(path));
    }
}
