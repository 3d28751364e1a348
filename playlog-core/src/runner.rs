//! Drives one job from `init` to a terminal state.
//!
//! Every event is appended to the job, persisted, and only then published,
//! so a subscriber that reads the stored job is never behind the bus.

use std::sync::Arc;

use playlog_model::{
    Credentials, EventLevel, JobRecord, JobState, ParsedRecord, StatusEvent,
};
use tracing::{debug, error, info, instrument, warn};

use crate::bus::StatusBus;
use crate::collector::{
    Collector, CollectorError, PageCursor, Progress, ProgressSink,
    SessionPage,
};
use crate::dedupe::dedupe;
use crate::scenario::ScenarioParser;
use crate::store::JobStore;

/// Message text carried by a fatal `error` event.
#[derive(Debug)]
struct Fatal(String);

/// Everything a runner needs besides the job itself.
#[derive(Debug)]
pub struct RunnerContext<C: Collector> {
    pub collector: Arc<C>,
    pub parser: Arc<ScenarioParser>,
    pub store: Arc<dyn JobStore>,
    pub bus: StatusBus,
}

impl<C: Collector> Clone for RunnerContext<C> {
    fn clone(&self) -> Self {
        Self {
            collector: Arc::clone(&self.collector),
            parser: Arc::clone(&self.parser),
            store: Arc::clone(&self.store),
            bus: self.bus.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Collected {
    records: Vec<ParsedRecord>,
    issues: Vec<String>,
}

pub struct JobRunner<C: Collector> {
    job: JobRecord,
    credentials: Credentials,
    ctx: RunnerContext<C>,
}

impl<C: Collector> std::fmt::Debug for JobRunner<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRunner")
            .field("job_id", &self.job.id)
            .field("state", &self.job.state)
            .finish()
    }
}

impl<C: Collector> JobRunner<C> {
    pub fn new(
        job: JobRecord,
        credentials: Credentials,
        ctx: RunnerContext<C>,
    ) -> Self {
        Self {
            job,
            credentials,
            ctx,
        }
    }

    /// Runs to `done` or `error` and returns the final record.
    #[instrument(skip_all, fields(job_id = %self.job.id))]
    pub async fn run(mut self) -> JobRecord {
        match self.drive().await {
            Ok(()) => info!(
                records = self.job.records.as_ref().map_or(0, Vec::len),
                "Job finished"
            ),
            Err(Fatal(message)) => self.fail(message).await,
        }
        self.job
    }

    async fn drive(&mut self) -> Result<(), Fatal> {
        self.emit(JobState::Login, EventLevel::Info, "Logging in...")
            .await?;

        let session = self
            .ctx
            .collector
            .login(&self.credentials)
            .await
            .map_err(|err| Fatal(format!("error logging in: {err}")))?;

        self.emit(
            JobState::Collecting,
            EventLevel::Info,
            "Getting sessions...",
        )
        .await?;

        let collected = self.collect(&session).await?;

        if !collected.issues.is_empty() {
            warn!(
                issues = collected.issues.len(),
                "Minor errors while parsing sessions"
            );
            self.emit(
                JobState::Collecting,
                EventLevel::Warning,
                format!(
                    "minor errors while parsing sessions: {}",
                    collected.issues.join(", ")
                ),
            )
            .await?;
        }

        let (played, facilitated) =
            collected.records.iter().fold((0, 0), |(p, f), r| {
                (
                    p + usize::from(r.raw.actor),
                    f + usize::from(r.raw.facilitator),
                )
            });
        self.emit(
            JobState::Collecting,
            EventLevel::Info,
            format!(
                "Got {} sessions ({} played, {} facilitated)",
                collected.records.len(),
                played,
                facilitated
            ),
        )
        .await?;

        let records = dedupe(collected.records);
        let count = records.len();
        let mut next = self.job.clone();
        let event = next
            .finish(records, format!("Done! {count} total unique scenarios"))
            .map_err(|err| Fatal(err.to_string()))?;
        self.commit(next, event).await
    }

    async fn collect(
        &mut self,
        session: &C::Session,
    ) -> Result<Collected, Fatal> {
        let mut collected = Collected::default();
        let mut cursor: Option<PageCursor> = None;

        loop {
            match self.fetch_page(session, cursor.as_ref()).await? {
                Ok(page) => {
                    let next = page.next.clone();
                    self.absorb(page, &mut collected);
                    match next {
                        Some(next) => cursor = Some(next),
                        None => break,
                    }
                }
                Err(CollectorError::Fetch {
                    message,
                    partial: Some(page),
                }) if !page.is_empty() => {
                    warn!(
                        rows = page.records.len(),
                        "Collector failed with partial results: {message}"
                    );
                    collected.issues.push(message);
                    self.absorb(page, &mut collected);
                    break;
                }
                Err(err) => {
                    return Err(Fatal(format!(
                        "error getting sessions: {err}"
                    )));
                }
            }
        }

        Ok(collected)
    }

    /// One listing call, turning progress reports into status events while
    /// the call is in flight.
    async fn fetch_page(
        &mut self,
        session: &C::Session,
        cursor: Option<&PageCursor>,
    ) -> Result<Result<SessionPage, CollectorError>, Fatal> {
        let (sink, mut progress) = ProgressSink::channel();
        let collector = Arc::clone(&self.ctx.collector);
        let call = collector.list_sessions(session, cursor, &sink);
        tokio::pin!(call);

        let result = loop {
            tokio::select! {
                biased;
                Some(update) = progress.recv() => {
                    self.report_progress(update).await?;
                }
                result = &mut call => break result,
            }
        };

        while let Ok(update) = progress.try_recv() {
            self.report_progress(update).await?;
        }
        Ok(result)
    }

    async fn report_progress(&mut self, update: Progress) -> Result<(), Fatal> {
        self.emit(
            JobState::Collecting,
            EventLevel::Info,
            format!(
                "Getting sessions ({}/{})...",
                update.current, update.total
            ),
        )
        .await
    }

    fn absorb(&self, page: SessionPage, collected: &mut Collected) {
        collected.issues.extend(page.issues);
        for raw in page.records {
            let scenario = match self.ctx.parser.parse(&raw.scenario_name) {
                Ok(scenario) => scenario,
                Err(err) => {
                    debug!("{err}");
                    collected.issues.push(err.to_string());
                    err.into_fallback()
                }
            };
            collected.records.push(ParsedRecord::new(raw, scenario));
        }
    }

    async fn emit(
        &mut self,
        state: JobState,
        level: EventLevel,
        message: impl Into<String>,
    ) -> Result<(), Fatal> {
        let mut next = self.job.clone();
        let event = next
            .record_event(state, level, message)
            .map_err(|err| Fatal(err.to_string()))?;
        self.commit(next, event).await
    }

    /// Persists `next`, adopts it, then publishes `event`. A job that fails
    /// to persist keeps its previous in-memory state.
    async fn commit(
        &mut self,
        next: JobRecord,
        event: StatusEvent,
    ) -> Result<(), Fatal> {
        self.ctx.store.save(&next).await.map_err(|err| {
            Fatal(format!("failed to save job state: {err}"))
        })?;
        self.job = next;
        debug!(
            state = %event.state,
            sequence = event.sequence,
            "{}",
            event.message
        );
        self.ctx.bus.publish(&event);
        Ok(())
    }

    /// Best effort: the error event is published even if it cannot be
    /// persisted. In that case the stored record stays non-terminal.
    async fn fail(&mut self, message: String) {
        error!(state = %self.job.state, "Job failed: {message}");
        let event = match self.job.record_event(
            JobState::Error,
            EventLevel::Error,
            message,
        ) {
            Ok(event) => event,
            Err(err) => {
                warn!("Cannot record failure on job: {err}");
                return;
            }
        };
        if let Err(err) = self.ctx.store.save(&self.job).await {
            error!("Failed to persist job failure: {err}");
        }
        self.ctx.bus.publish(&event);
    }
}
