//! Persisted job data and the runtime-only credentials that drive it.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::chrono::{DateTime, Utc};
use crate::error::ModelError;
use crate::events::{EventLevel, StatusEvent};
use crate::ids::JobId;
use crate::records::CanonicalRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Init,
    Login,
    Collecting,
    Done,
    Error,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Error)
    }

    fn rank(&self) -> u8 {
        match self {
            JobState::Init => 0,
            JobState::Login => 1,
            JobState::Collecting => 2,
            JobState::Done | JobState::Error => 3,
        }
    }

    /// Terminal states are final. Otherwise a job may re-emit its current
    /// state, move forward along init → login → collecting → done, or fail.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == JobState::Error || next.rank() >= self.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Init => "init",
            JobState::Login => "login",
            JobState::Collecting => "collecting",
            JobState::Done => "done",
            JobState::Error => "error",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable job record. Only serializable data lives here; credentials and
/// any runtime handles are held by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<StatusEvent>,
    /// `None` until the job is done; an empty list is a real result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<CanonicalRecord>>,
}

impl JobRecord {
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            state: JobState::Init,
            created_at: Utc::now(),
            messages: Vec::new(),
            records: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == JobState::Done
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn last_event(&self) -> Option<&StatusEvent> {
        self.messages.last()
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_event().map(|event| event.sequence).unwrap_or(0)
    }

    /// Appends a status event, moving the job to `state`.
    ///
    /// The new timestamp is clamped to the previous one so the log stays
    /// non-decreasing even if the wall clock steps backwards.
    pub fn record_event(
        &mut self,
        state: JobState,
        level: EventLevel,
        message: impl Into<String>,
    ) -> Result<StatusEvent, ModelError> {
        if !self.state.can_transition_to(state) {
            return Err(ModelError::InvalidTransition {
                from: self.state,
                to: state,
            });
        }

        let now = Utc::now();
        let timestamp = match self.last_event() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        let event = StatusEvent {
            job_id: self.id.clone(),
            sequence: self.last_sequence() + 1,
            timestamp,
            state,
            level,
            message: message.into(),
        };

        self.state = state;
        self.messages.push(event.clone());
        Ok(event)
    }

    /// Stores the final record set and appends the terminal `done` event.
    pub fn finish(
        &mut self,
        records: Vec<CanonicalRecord>,
        message: impl Into<String>,
    ) -> Result<StatusEvent, ModelError> {
        let event =
            self.record_event(JobState::Done, EventLevel::Info, message)?;
        self.records = Some(records);
        Ok(event)
    }

    /// Messages strictly newer than `since`, or all of them.
    pub fn events_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> impl Iterator<Item = &StatusEvent> {
        self.messages
            .iter()
            .filter(move |event| since.is_none_or(|cut| event.timestamp > cut))
    }
}

/// Account credentials for the remote collector. Never serialized, wiped
/// on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobRecord {
        JobRecord::new(JobId::generate())
    }

    #[test]
    fn events_are_sequenced_and_non_decreasing() {
        let mut job = job();
        let first = job
            .record_event(JobState::Login, EventLevel::Info, "Logging in...")
            .unwrap();
        let second = job
            .record_event(JobState::Collecting, EventLevel::Info, "Listing")
            .unwrap();
        let third = job
            .record_event(JobState::Collecting, EventLevel::Info, "(1/2)")
            .unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(third.sequence, 3);
        assert!(first.timestamp <= second.timestamp);
        assert!(second.timestamp <= third.timestamp);
        assert_eq!(job.state, JobState::Collecting);
        assert_eq!(job.messages.len(), 3);
    }

    #[test]
    fn terminal_states_reject_further_events() {
        let mut job = job();
        job.record_event(JobState::Error, EventLevel::Error, "boom")
            .unwrap();
        let err = job
            .record_event(JobState::Collecting, EventLevel::Info, "again")
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidTransition {
                from: JobState::Error,
                to: JobState::Collecting,
            }
        );
        assert!(job.finish(Vec::new(), "done").is_err());
        assert_eq!(job.messages.len(), 1);
    }

    #[test]
    fn states_do_not_move_backwards() {
        assert!(JobState::Collecting.can_transition_to(JobState::Collecting));
        assert!(!JobState::Collecting.can_transition_to(JobState::Login));
        assert!(JobState::Init.can_transition_to(JobState::Error));
        assert!(!JobState::Done.can_transition_to(JobState::Error));
    }

    #[test]
    fn finish_sets_records_even_when_empty() {
        let mut job = job();
        assert!(job.records.is_none());
        job.finish(Vec::new(), "Done! 0 total unique scenarios")
            .unwrap();
        assert_eq!(job.records, Some(Vec::new()));
        assert!(job.is_done());
    }

    #[test]
    fn serialization_omits_credentials_and_ignores_unknown_fields() {
        let mut job = job();
        job.record_event(JobState::Login, EventLevel::Info, "Logging in...")
            .unwrap();
        let mut value = serde_json::to_value(&job).unwrap();
        assert!(value.get("records").is_none());
        value["legacy_field"] = serde_json::json!("ignored");
        let decoded: JobRecord = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, job);
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = Credentials::new("gm@example.com", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("gm@example.com"));
        assert!(!rendered.contains("hunter2"));
    }
}
