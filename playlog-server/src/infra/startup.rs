use std::sync::Arc;

use anyhow::Context;
use playlog_core::{
    CacheJobStore, FixtureCollector, JobService, JobStore, ScenarioParser,
    StatusBus,
};
use tracing::info;

use crate::infra::{
    app_state::AppState,
    config::{Config, StoreConfig},
};

/// Builds the job store, collector and service described by `config`.
pub async fn build_app_state(config: Config) -> anyhow::Result<AppState> {
    let store = open_store(&config.store).await?;

    let collector = match &config.fixture_path {
        Some(path) => FixtureCollector::from_path(path)
            .await
            .with_context(|| {
                format!(
                    "failed to load fixture accounts from {}",
                    path.display()
                )
            })?,
        None => FixtureCollector::default(),
    };

    let jobs = JobService::new(
        store,
        StatusBus::new(),
        Arc::new(collector),
        ScenarioParser::new(config.parser.clone()),
    );
    Ok(AppState::new(Arc::new(jobs), Arc::new(config)))
}

async fn open_store(store: &StoreConfig) -> anyhow::Result<Arc<dyn JobStore>> {
    match store {
        StoreConfig::Cache { root } => {
            info!("Storing jobs in cache directory {}", root.display());
            Ok(Arc::new(CacheJobStore::new(root.clone())))
        }
        #[cfg(feature = "database")]
        StoreConfig::Postgres { url } => {
            let store = playlog_core::PostgresJobStore::connect(url)
                .await
                .context("failed to connect job store to PostgreSQL")?;
            info!("Storing jobs in PostgreSQL");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "database"))]
        StoreConfig::Postgres { .. } => {
            tracing::warn!(
                "A database URL is configured but this build lacks the \
                 `database` feature; falling back to {}",
                super::config::DEFAULT_CACHE_DIR
            );
            Ok(Arc::new(CacheJobStore::new(super::config::DEFAULT_CACHE_DIR)))
        }
    }
}
