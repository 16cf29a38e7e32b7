//! Configuration loading and resolution
//!
//! Settings resolve with ENV → TOML → default priority. The MangaDex client
//! identity has no compiled default: MangaDex rejects anonymous clients, so a
//! missing identity is a configuration error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Environment variable naming the SQLite database file
pub const ENV_DATABASE_PATH: &str = "MSHELF_DATABASE_PATH";
/// Environment variable naming the MangaDex client identity (User-Agent value)
pub const ENV_MD_USER_AGENT: &str = "MSHELF_MD_USER_AGENT";
/// Environment variable overriding the listen port
pub const ENV_PORT: &str = "MSHELF_ME_PORT";

/// TOML config file contents for mshelf-me
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to the shared SQLite database file
    pub database_path: Option<String>,
    /// Client identity sent to MangaDex in the User-Agent header
    pub mangadex_user_agent: Option<String>,
    /// HTTP listen port
    pub port: Option<u16>,
}

impl TomlConfig {
    /// Load config from the platform config file, or defaults if absent
    pub fn load() -> Self {
        match config_file_path() {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        warn!("Failed to parse {}: {} (using defaults)", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("Failed to read {}: {} (using defaults)", path.display(), e);
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }
}

/// Platform config file path (~/.config/mshelf/mshelf-me.toml on Linux)
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mshelf").join("mshelf-me.toml"))
}

/// Resolve the database path: ENV → TOML → platform data dir default
pub fn resolve_database_path(config: &TomlConfig) -> PathBuf {
    if let Ok(path) = std::env::var(ENV_DATABASE_PATH) {
        info!("Database path from environment: {}", path);
        return PathBuf::from(path);
    }

    if let Some(path) = &config.database_path {
        info!("Database path from TOML config: {}", path);
        return PathBuf::from(path);
    }

    let default = dirs::data_local_dir()
        .map(|d| d.join("mshelf"))
        .unwrap_or_else(|| PathBuf::from("./mshelf_data"))
        .join("mshelf.db");
    info!("Database path default: {}", default.display());
    default
}

/// Resolve the MangaDex client identity: ENV → TOML → error
///
/// A blank identity is treated the same as a missing one.
pub fn resolve_mangadex_user_agent(config: &TomlConfig) -> Result<String> {
    let env_value = std::env::var(ENV_MD_USER_AGENT).ok();
    let toml_value = config.mangadex_user_agent.as_ref();

    if env_value.as_deref().is_some_and(is_valid_value)
        && toml_value.map(|v| is_valid_value(v)).unwrap_or(false)
    {
        warn!(
            "MangaDex client identity found in both environment and TOML. \
             Using environment (highest priority)."
        );
    }

    if let Some(value) = env_value {
        if is_valid_value(&value) {
            info!("MangaDex client identity loaded from environment variable");
            return Ok(value);
        }
    }

    if let Some(value) = toml_value {
        if is_valid_value(value) {
            info!("MangaDex client identity loaded from TOML config");
            return Ok(value.clone());
        }
    }

    Err(Error::Config(format!(
        "MangaDex client identity not configured. Please configure using one of:\n\
         1. Environment: {}=\"mshelf/0.1 (+https://example.org/mshelf)\"\n\
         2. TOML config: mangadex_user_agent in {}",
        ENV_MD_USER_AGENT,
        config_file_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<config dir unavailable>".to_string())
    )))
}

/// Resolve the listen port: ENV → TOML → default
pub fn resolve_port(config: &TomlConfig, default: u16) -> u16 {
    if let Ok(value) = std::env::var(ENV_PORT) {
        if let Ok(port) = value.parse() {
            return port;
        }
        warn!("Ignoring unparseable {}={}", ENV_PORT, value);
    }

    config.port.unwrap_or(default)
}

/// Validate a configured value (non-empty, non-whitespace)
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}
