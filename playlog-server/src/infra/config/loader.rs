use once_cell::sync::Lazy;
use std::{fs, path::PathBuf};
use thiserror::Error;

use super::{
    Config, ConfigMetadata, DEFAULT_CACHE_DIR, DEFAULT_HOST,
    DEFAULT_LOG_FILTER, DEFAULT_PORT, ServerConfig, StoreConfig,
    sources::{EnvConfig, FileConfig},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("playlog.toml"),
        PathBuf::from("config/playlog.toml"),
    ]
});

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to load .env file: {0}")]
    Env(#[from] dotenvy::Error),

    #[error("configuration file {path:?} does not exist")]
    MissingConfig { path: PathBuf },

    #[error("failed to read configuration file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: &'static str, value: String },
}

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

/// Resolved configuration plus anything worth telling the operator about.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: Vec<String>,
}

/// Layers configuration as environment over TOML file over defaults.
/// Command-line overrides are applied by the binary afterwards.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let env = EnvConfig::gather()?;
        let (file, config_path) = self.load_file_config(&env)?;

        let mut load = compose_config(file, env);
        load.config.metadata = ConfigMetadata {
            config_path,
            env_file_loaded,
        };
        Ok(load)
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(path) => path.clone(),
                None => return Ok((None, None)),
            },
        };

        let contents =
            fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
                path: path.clone(),
                source: err,
            })?;
        let file: FileConfig = toml::from_str(&contents).map_err(|err| {
            ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            }
        })?;
        Ok((Some(file), Some(path)))
    }
}

/// Merges environment values over file values over defaults.
pub fn compose_config(file: Option<FileConfig>, env: EnvConfig) -> ConfigLoad {
    let mut warnings = Vec::new();
    if file.is_none() {
        warnings.push(
            "No playlog.toml found; using environment variables and defaults"
                .to_string(),
        );
    }
    let file = file.unwrap_or_default();

    let server = ServerConfig {
        host: env
            .server_host
            .or(file.server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: env.server_port.or(file.server.port).unwrap_or(DEFAULT_PORT),
    };

    let store = match env.database_url.or(file.store.database_url) {
        Some(url) => StoreConfig::Postgres { url },
        None => StoreConfig::Cache {
            root: env
                .cache_dir
                .or(file.store.cache_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
        },
    };

    let mut parser = file.parser.unwrap_or_default();
    if let Some(sessions) = env.sessions_per_series {
        parser.sessions_per_series = sessions;
    }
    if parser.sessions_per_series == 0 {
        warnings.push(
            "parser.sessions_per_series = 0 is treated as 1".to_string(),
        );
    }

    let fixture_path = env.fixture_path.or(file.fixture_path);

    let config = Config {
        server,
        store,
        fixture_path,
        log_filter: env
            .log_filter
            .or(file.log_filter)
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        parser,
        metadata: ConfigMetadata::default(),
    };

    ConfigLoad { config, warnings }
}
