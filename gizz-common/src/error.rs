//! Errors raised while loading quiz configuration

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Config file exists but could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for [`crate::config::TomlConfig`]
    #[error("Parse TOML failed ({}): {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Values parsed but out of range, or an unusable listen address
    #[error("Configuration error: {0}")]
    Config(String),
}
