pub mod events;
pub mod export;
pub mod jobs;

use playlog_core::model::JobId;

use crate::infra::errors::{AppError, AppResult};

/// Job ids are opaque to clients; a malformed one cannot name a job.
pub(crate) fn parse_job_id(raw: &str) -> AppResult<JobId> {
    JobId::parse(raw)
        .map_err(|_| AppError::not_found(format!("Job not found: {raw}")))
}
