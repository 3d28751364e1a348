pub mod loader;
pub mod sources;

use std::path::PathBuf;

use playlog_core::ScenarioParserConfig;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CACHE_DIR: &str = "cache/playlog";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=warn";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    /// Accounts served by the fixture collector. Without it every login
    /// fails.
    pub fixture_path: Option<PathBuf>,
    pub log_filter: String,
    pub parser: ScenarioParserConfig,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where job records live.
#[derive(Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Cache { root: PathBuf },
    Postgres { url: String },
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Cache { root } => {
                f.debug_struct("Cache").field("root", root).finish()
            }
            // URLs may carry credentials.
            StoreConfig::Postgres { .. } => {
                f.debug_struct("Postgres").finish_non_exhaustive()
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
            },
            store: StoreConfig::Cache {
                root: PathBuf::from(DEFAULT_CACHE_DIR),
            },
            fixture_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            parser: ScenarioParserConfig::default(),
            metadata: ConfigMetadata::default(),
        }
    }
}
