//! Collection engine for organized-play session history.
//!
//! A [`JobService`] accepts credentials, runs one [`JobRunner`] per job in
//! the background and exposes the job's persisted state and live
//! [`StatusEvent`](playlog_model::StatusEvent)s. Runners log in through a
//! [`Collector`], parse every row's scenario name with [`ScenarioParser`]
//! and merge duplicates with [`dedupe`].
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

pub use playlog_model as model;

pub mod bus;
pub mod collector;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod runner;
pub mod scenario;
pub mod service;
pub mod store;
pub mod table;

#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use bus::{StatusBus, Subscription, SubscriptionKey};
pub use collector::{
    Collector, CollectorError, FixtureCollector, PageCursor, Progress,
    ProgressSink, SessionPage,
};
pub use config::ScenarioParserConfig;
pub use dedupe::{dedupe, dedupe_aligned};
pub use error::{EngineError, Result};
pub use runner::{JobRunner, RunnerContext};
pub use scenario::{ParseFailure, ScenarioParseError, ScenarioParser};
pub use service::{JobService, StatusEventStream};
pub use store::{CacheJobStore, JobStore};
#[cfg(feature = "database")]
pub use store::PostgresJobStore;
pub use table::{ColumnLayout, DecodedRow, decode_row};
