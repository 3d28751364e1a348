//! Core data model definitions shared across playlog crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod error;
pub mod events;
pub mod ids;
pub mod job;
pub mod records;
pub mod scenario;
pub mod system;

pub use error::{ModelError, Result as ModelResult};
pub use events::{EventLevel, StatusEvent};
pub use ids::JobId;
pub use job::{Credentials, JobRecord, JobState};
pub use records::{CanonicalRecord, ParsedRecord, RawRecord};
pub use scenario::{NOT_NUMBERED, ScenarioIdentifier};
pub use system::GameSystem;
