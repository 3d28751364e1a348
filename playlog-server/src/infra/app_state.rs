use std::{fmt, sync::Arc};

use playlog_core::{FixtureCollector, JobService};

use crate::infra::config::Config;

/// The job service as wired by this server.
pub type Jobs = JobService<FixtureCollector>;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<Jobs>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(jobs: Arc<Jobs>, config: Arc<Config>) -> Self {
        Self { jobs, config }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("jobs", &self.jobs)
            .finish_non_exhaustive()
    }
}
