use serde::{Deserialize, Serialize};

use crate::chrono::{DateTime, Utc};
use crate::ids::JobId;
use crate::job::JobState;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    #[default]
    Info,
    Warning,
    Error,
}

/// One immutable progress message belonging to a job.
///
/// `sequence` is the 1-based position in the job's message log and is the
/// key observers use to drop duplicates at the backfill/live join point.
/// `timestamp` never decreases within a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub job_id: JobId,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub state: JobState,
    #[serde(default)]
    pub level: EventLevel,
    pub message: String,
}

impl StatusEvent {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
