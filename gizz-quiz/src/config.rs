//! Bootstrap configuration for the quiz service
//!
//! **Priority:** CLI flag → environment variable → TOML file → built-in default

use gizz_common::config::{load_or_default, resolve_config_path, TomlConfig};
use gizz_common::{Error, Result};
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

/// Load the TOML config and apply the port override
///
/// `port_override` carries `--port` / `GIZZ_QUIZ_PORT` (clap reads both).
pub fn resolve_service_config(
    cli_config: Option<&Path>,
    port_override: Option<u16>,
) -> Result<TomlConfig> {
    let path = resolve_config_path(cli_config);
    let mut config = load_or_default(path.as_deref())?;

    if let Some(port) = port_override {
        if port != config.port {
            info!(toml_port = config.port, port = port, "Port overridden from command line");
        }
        config.port = port;
    }

    Ok(config)
}

/// Socket address to bind from `bind_address` and `port`
pub fn listen_addr(config: &TomlConfig) -> Result<SocketAddr> {
    format!("{}:{}", config.bind_address, config.port)
        .parse()
        .map_err(|e| {
            Error::Config(format!(
                "Invalid bind address {}:{}: {}",
                config.bind_address, config.port, e
            ))
        })
}

/// Log filter directive used when RUST_LOG is not set
pub fn default_log_filter(config: &TomlConfig) -> String {
    let level = config.logging.level.trim().to_lowercase();
    format!("gizz_quiz={level},gizz_common={level},tower_http=info,warn")
}
