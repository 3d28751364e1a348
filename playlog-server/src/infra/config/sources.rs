use std::path::PathBuf;

use playlog_core::ScenarioParserConfig;
use serde::{Deserialize, Serialize};

use super::loader::ConfigLoadError;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub store: FileStoreConfig,
    pub fixture_path: Option<PathBuf>,
    pub log_filter: Option<String>,
    pub parser: Option<ScenarioParserConfig>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileStoreConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
}

/// Values picked up from the process environment (after `.env` loading).
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub cache_dir: Option<PathBuf>,
    pub database_url: Option<String>,
    pub fixture_path: Option<PathBuf>,
    pub log_filter: Option<String>,
    pub sessions_per_series: Option<u32>,
}

impl EnvConfig {
    pub fn gather() -> Result<Self, ConfigLoadError> {
        Ok(Self {
            config_path: var("PLAYLOG_CONFIG").map(PathBuf::from),
            server_host: var("SERVER_HOST"),
            server_port: parsed_var("SERVER_PORT")?,
            cache_dir: var("PLAYLOG_CACHE_DIR").map(PathBuf::from),
            database_url: var("DATABASE_URL"),
            fixture_path: var("PLAYLOG_FIXTURE").map(PathBuf::from),
            log_filter: var("PLAYLOG_LOG"),
            sessions_per_series: parsed_var("PLAYLOG_SESSIONS_PER_SERIES")?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed_var<T: std::str::FromStr>(
    key: &'static str,
) -> Result<Option<T>, ConfigLoadError> {
    var(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigLoadError::InvalidEnv { key, value })
        })
        .transpose()
}
