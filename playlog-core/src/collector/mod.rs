//! Contract for the external source of session rows.
//!
//! A collector logs in once per job and then serves one page of rows per
//! [`Collector::list_sessions`] call until it stops returning a cursor.
//! Progress is pushed through a [`ProgressSink`] while a call is in flight.

pub mod fixture;

use async_trait::async_trait;
use playlog_model::{Credentials, RawRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

pub use fixture::{FixtureAccount, FixtureCollector, FixtureData};

/// Opaque position of the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

/// Sending half of a per-call progress channel. Reports after the runner
/// stopped listening are dropped.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<Progress>,
}

impl ProgressSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Progress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn report(&self, current: usize, total: usize) {
        let _ = self.tx.send(Progress { current, total });
    }
}

/// One page of rows. `issues` carries per-row problems the collector hit
/// while decoding; they never abort the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPage {
    pub records: Vec<RawRecord>,
    pub issues: Vec<String>,
    pub next: Option<PageCursor>,
}

impl SessionPage {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("{0}")]
    Login(String),

    /// A listing call failed. Rows produced before the failure, if any, are
    /// in `partial`.
    #[error("{message}")]
    Fetch {
        message: String,
        partial: Option<SessionPage>,
    },
}

impl CollectorError {
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
            partial: None,
        }
    }

    pub fn partial(message: impl Into<String>, page: SessionPage) -> Self {
        Self::Fetch {
            message: message.into(),
            partial: Some(page),
        }
    }
}

#[async_trait]
pub trait Collector: Send + Sync + 'static {
    type Session: Send + Sync;

    async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<Self::Session, CollectorError>;

    /// Fetches the page at `cursor`, or the first page when `None`.
    async fn list_sessions(
        &self,
        session: &Self::Session,
        cursor: Option<&PageCursor>,
        progress: &ProgressSink,
    ) -> Result<SessionPage, CollectorError>;
}
