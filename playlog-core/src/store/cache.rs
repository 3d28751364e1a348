use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use playlog_model::{JobId, JobRecord};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::JobStore;
use crate::error::{EngineError, Result};

/// [`JobStore`] over a `cacache` directory, one JSON entry per job.
///
/// cacache writes content before it appends the index entry, so a failed
/// write leaves the previous record readable.
#[derive(Debug)]
pub struct CacheJobStore {
    root: PathBuf,
    write_locks: DashMap<JobId, Arc<Mutex<()>>>,
}

fn cache_key(id: &JobId) -> String {
    format!("job:{id}")
}

impl CacheJobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_locks: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_lock(&self, id: &JobId) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Forgets the job's lock once no other writer holds or awaits it.
    fn release_write_lock(&self, id: &JobId) {
        self.write_locks
            .remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
    }

    async fn read_one(&self, id: &JobId) -> Result<Option<JobRecord>> {
        let bytes = match cacache::read(&self.root, cache_key(id)).await {
            Ok(bytes) => bytes,
            Err(cacache::Error::EntryNotFound(_, _)) => return Ok(None),
            Err(cacache::Error::IntegrityError(err)) => {
                warn!(
                    job_id = %id,
                    "Skipping job entry that failed integrity check: {err}"
                );
                return Ok(None);
            }
            Err(cacache::Error::SizeMismatch(wanted, actual)) => {
                warn!(
                    job_id = %id,
                    "Skipping job entry with size mismatch: \
                     wanted={wanted}, actual={actual}"
                );
                return Ok(None);
            }
            Err(err) => {
                return Err(EngineError::Store(format!(
                    "cacache read failed for job {id}: {err}"
                )));
            }
        };

        match serde_json::from_slice::<JobRecord>(&bytes) {
            Ok(job) => Ok(Some(job)),
            Err(err) => {
                warn!(job_id = %id, "Skipping unreadable job record: {err}");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl JobStore for CacheJobStore {
    #[instrument(skip_all, fields(job_id = %job.id, state = %job.state))]
    async fn save(&self, job: &JobRecord) -> Result<()> {
        let bytes = serde_json::to_vec(job)?;
        let written = {
            let lock = self.write_lock(&job.id);
            let _guard = lock.lock().await;
            cacache::write(&self.root, cache_key(&job.id), bytes).await
        };
        self.release_write_lock(&job.id);

        written.map_err(|err| {
            EngineError::Store(format!(
                "cacache write failed for job {}: {err}",
                job.id
            ))
        })?;
        debug!("Saved job record");
        Ok(())
    }

    async fn load_many(&self, ids: &[JobId]) -> Result<Vec<JobRecord>> {
        let mut jobs = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(job) = self.read_one(id).await? {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }
}
