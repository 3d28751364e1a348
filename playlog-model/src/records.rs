//! Row-level records before and after de-duplication.

use serde::{Deserialize, Serialize};

use crate::chrono::{DateTime, Utc};
use crate::scenario::ScenarioIdentifier;

/// One row as produced by a collector.
///
/// The facilitator role is carried only by `facilitator`; participant ids
/// are never sign-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub event_numbers: Vec<i64>,
    #[serde(default)]
    pub participants: Vec<i64>,
    pub scenario_name: String,
    #[serde(default)]
    pub actor: bool,
    #[serde(default)]
    pub facilitator: bool,
}

impl RawRecord {
    pub fn new(scenario_name: impl Into<String>) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            ..Self::default()
        }
    }
}

/// A raw row paired with the identifier parsed from its scenario name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub raw: RawRecord,
    pub scenario: ScenarioIdentifier,
}

impl ParsedRecord {
    pub fn new(raw: RawRecord, scenario: ScenarioIdentifier) -> Self {
        Self { raw, scenario }
    }
}

/// Merged output record; unique per `scenario.canonical_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(flatten)]
    pub scenario: ScenarioIdentifier,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub event_numbers: Vec<i64>,
    #[serde(default)]
    pub participants: Vec<i64>,
    #[serde(default)]
    pub actor: bool,
    #[serde(default)]
    pub facilitator: bool,
}

impl CanonicalRecord {
    pub fn from_parsed(parsed: ParsedRecord) -> Self {
        let ParsedRecord { raw, scenario } = parsed;
        Self {
            scenario,
            date: raw.date,
            event_numbers: raw.event_numbers,
            participants: raw.participants,
            actor: raw.actor,
            facilitator: raw.facilitator,
        }
    }

    /// The merged record as a single collector row named by its canonical
    /// name.
    pub fn to_raw(&self) -> RawRecord {
        self.to_parsed().raw
    }

    /// Re-expresses the merged record as a single parsed row.
    pub fn to_parsed(&self) -> ParsedRecord {
        ParsedRecord {
            raw: RawRecord {
                date: self.date,
                event_numbers: self.event_numbers.clone(),
                participants: self.participants.clone(),
                scenario_name: self.scenario.canonical_name.clone(),
                actor: self.actor,
                facilitator: self.facilitator,
            },
            scenario: self.scenario.clone(),
        }
    }

    pub fn role_label(&self) -> &'static str {
        match (self.actor, self.facilitator) {
            (true, true) => "P/GM",
            (true, false) => "P",
            (false, true) => "GM",
            (false, false) => "",
        }
    }
}
