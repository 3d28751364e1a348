//! Durable job storage.
//!
//! Every write replaces the whole [`JobRecord`] for its id. Reads never
//! fail on a missing or unreadable record: `load` reports it as absent and
//! `load_many` skips it.

use async_trait::async_trait;
use playlog_model::{JobId, JobRecord};

use crate::error::Result;

pub mod cache;
#[cfg(feature = "database")]
#[cfg_attr(docsrs, doc(cfg(feature = "database")))]
pub mod postgres;

pub use cache::CacheJobStore;
#[cfg(feature = "database")]
pub use postgres::PostgresJobStore;

#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug {
    /// Atomically replaces the stored record for `job.id`.
    async fn save(&self, job: &JobRecord) -> Result<()>;

    /// Existing, readable records among `ids`, in request order.
    async fn load_many(&self, ids: &[JobId]) -> Result<Vec<JobRecord>>;

    async fn load(&self, id: &JobId) -> Result<Option<JobRecord>> {
        Ok(self
            .load_many(std::slice::from_ref(id))
            .await?
            .into_iter()
            .next())
    }
}
