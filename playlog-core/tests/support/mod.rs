#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use playlog_core::error::{EngineError, Result};
use playlog_core::{
    Collector, CollectorError, JobStore, PageCursor, ProgressSink,
    RunnerContext, ScenarioParser, SessionPage, StatusBus,
};
use playlog_core::model::{Credentials, JobId, JobRecord, RawRecord};
use tokio::sync::Notify;

pub type PageResult = std::result::Result<SessionPage, CollectorError>;

/// Collector that replays a fixed script of pages.
#[derive(Debug, Default)]
pub struct ScriptedCollector {
    pub login_error: Option<String>,
    pub pages: Mutex<VecDeque<PageResult>>,
    pub progress: Vec<(usize, usize)>,
    /// When set, every listing call waits for a permit first.
    pub gate: Option<Arc<Notify>>,
}

impl ScriptedCollector {
    pub fn with_pages(pages: Vec<PageResult>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Self::default()
        }
    }

    pub fn failing_login(message: &str) -> Self {
        Self {
            login_error: Some(message.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Collector for ScriptedCollector {
    type Session = ();

    async fn login(
        &self,
        _credentials: &Credentials,
    ) -> std::result::Result<(), CollectorError> {
        match &self.login_error {
            Some(message) => Err(CollectorError::Login(message.clone())),
            None => Ok(()),
        }
    }

    async fn list_sessions(
        &self,
        _session: &(),
        _cursor: Option<&PageCursor>,
        progress: &ProgressSink,
    ) -> PageResult {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        for (current, total) in &self.progress {
            progress.report(*current, *total);
        }
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SessionPage::default()))
    }
}

/// In-memory store whose saves can be made to fail.
#[derive(Default)]
pub struct MemoryStore {
    jobs: Mutex<HashMap<JobId, JobRecord>>,
    fail_when: Option<fn(&JobRecord) -> bool>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl MemoryStore {
    pub fn failing_when(predicate: fn(&JobRecord) -> bool) -> Self {
        Self {
            fail_when: Some(predicate),
            ..Self::default()
        }
    }

    pub fn get(&self, id: &JobId) -> Option<JobRecord> {
        self.jobs.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn save(&self, job: &JobRecord) -> Result<()> {
        if self.fail_when.is_some_and(|fail| fail(job)) {
            return Err(EngineError::Store("disk full".into()));
        }
        self.jobs.lock().unwrap().insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn load_many(&self, ids: &[JobId]) -> Result<Vec<JobRecord>> {
        let jobs = self.jobs.lock().unwrap();
        Ok(ids.iter().filter_map(|id| jobs.get(id).cloned()).collect())
    }
}

pub fn context<C: Collector>(
    collector: C,
    store: Arc<dyn JobStore>,
) -> RunnerContext<C> {
    RunnerContext {
        collector: Arc::new(collector),
        parser: Arc::new(ScenarioParser::default()),
        store,
        bus: StatusBus::new(),
    }
}

pub fn credentials() -> Credentials {
    Credentials::new("player@example.com", "correct horse")
}

pub fn session(
    name: &str,
    day: u32,
    participant: i64,
    facilitator: bool,
) -> RawRecord {
    RawRecord {
        date: Some(Utc.with_ymd_and_hms(2021, 6, day, 18, 0, 0).unwrap()),
        event_numbers: vec![4000 + i64::from(day)],
        participants: vec![participant],
        scenario_name: name.to_string(),
        actor: !facilitator,
        facilitator,
    }
}

pub fn page(records: Vec<RawRecord>, next: Option<&str>) -> SessionPage {
    SessionPage {
        records,
        issues: Vec::new(),
        next: next.map(|cursor| PageCursor(cursor.to_string())),
    }
}
