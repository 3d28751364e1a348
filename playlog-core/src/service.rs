use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::Stream;
use playlog_model::{Credentials, JobId, JobRecord, StatusEvent};
use tokio_util::task::TaskTracker;
use tracing::{info, instrument};

use crate::bus::StatusBus;
use crate::collector::Collector;
use crate::error::{EngineError, Result};
use crate::runner::{JobRunner, RunnerContext};
use crate::scenario::ScenarioParser;
use crate::store::JobStore;

pub type StatusEventStream = Pin<Box<dyn Stream<Item = StatusEvent> + Send>>;

/// Entry point for submitting, querying and following jobs.
pub struct JobService<C: Collector> {
    ctx: RunnerContext<C>,
    tracker: TaskTracker,
}

impl<C: Collector> fmt::Debug for JobService<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobService")
            .field("store", &self.ctx.store)
            .field("bus", &self.ctx.bus)
            .field("running_jobs", &self.tracker.len())
            .finish()
    }
}

impl<C: Collector> JobService<C> {
    pub fn new(
        store: Arc<dyn JobStore>,
        bus: StatusBus,
        collector: Arc<C>,
        parser: ScenarioParser,
    ) -> Self {
        Self {
            ctx: RunnerContext {
                collector,
                parser: Arc::new(parser),
                store,
                bus,
            },
            tracker: TaskTracker::new(),
        }
    }

    pub fn bus(&self) -> &StatusBus {
        &self.ctx.bus
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.ctx.store
    }

    pub fn running_jobs(&self) -> usize {
        self.tracker.len()
    }

    /// Persists a new job in `init` and starts its runner in the background.
    #[instrument(skip_all, fields(email = %credentials.email()))]
    pub async fn create_job(&self, credentials: Credentials) -> Result<JobId> {
        if self.tracker.is_closed() {
            return Err(EngineError::ShuttingDown);
        }

        let job = JobRecord::new(JobId::generate());
        let id = job.id.clone();
        self.ctx.store.save(&job).await?;

        let runner = JobRunner::new(job, credentials, self.ctx.clone());
        self.tracker.spawn(runner.run());
        info!(job_id = %id, "Started job");
        Ok(id)
    }

    pub async fn get_job(&self, id: &JobId) -> Result<Option<JobRecord>> {
        self.ctx.store.load(id).await
    }

    pub async fn get_jobs(&self, ids: &[JobId]) -> Result<Vec<JobRecord>> {
        self.ctx.store.load_many(ids).await
    }

    /// Replays stored events newer than `since`, then follows live ones.
    ///
    /// The bus subscription is taken before the job is read, so nothing
    /// published in between is lost; live events already covered by the
    /// replay are skipped by sequence. The stream ends after a terminal
    /// event. Returns `None` for an unknown job.
    ///
    /// There is no timeout, so the stream stays open for as long as the job
    /// is not terminal. That includes a runner stuck in a collector call,
    /// and a job whose error event could not be persisted: only subscribers
    /// attached at the time see that event, and a later subscription finds
    /// a non-terminal record that no runner will finish.
    pub async fn subscribe_to_job(
        &self,
        id: &JobId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<StatusEventStream>> {
        let bus = self.ctx.bus.clone();
        let mut subscription = bus.subscribe(id);

        let job = match self.ctx.store.load(id).await {
            Ok(Some(job)) => job,
            other => {
                bus.unsubscribe(subscription.key());
                return other.map(|_| None);
            }
        };

        let replay: Vec<StatusEvent> =
            job.events_since(since).cloned().collect();
        let replayed_through = job.last_sequence();
        let finished = job.is_terminal();

        let stream = async_stream::stream! {
            for event in replay {
                yield event;
            }
            if !finished {
                while let Some(event) = subscription.recv().await {
                    if event.sequence <= replayed_through {
                        continue;
                    }
                    let terminal = event.is_terminal();
                    yield event;
                    if terminal {
                        break;
                    }
                }
            }
            bus.unsubscribe(subscription.key());
        };
        Ok(Some(Box::pin(stream)))
    }

    /// Stops accepting jobs and waits for every running job to finish.
    pub async fn shutdown(&self) {
        self.tracker.close();
        if !self.tracker.is_empty() {
            info!(running = self.tracker.len(), "Waiting for running jobs");
        }
        self.tracker.wait().await;
    }
}
