//! Scenario-level de-duplication.
//!
//! Rows are grouped by `canonical_name`. Within a group the event and
//! participant lists are concatenated as-is, role flags are OR'd, the system
//! is taken from the first row that knows it, and the date is the earliest
//! one seen. Output is sorted by date with undated records first; equal
//! dates keep the order in which their group was first seen.

use indexmap::IndexMap;
use indexmap::map::Entry;
use playlog_model::{
    CanonicalRecord, ParsedRecord, RawRecord, ScenarioIdentifier,
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{records} records but {identifiers} identifiers")]
pub struct MisalignedInput {
    pub records: usize,
    pub identifiers: usize,
}

pub fn dedupe<I>(records: I) -> Vec<CanonicalRecord>
where
    I: IntoIterator<Item = ParsedRecord>,
{
    let mut groups: IndexMap<String, CanonicalRecord> = IndexMap::new();

    for parsed in records {
        match groups.entry(parsed.scenario.canonical_name.clone()) {
            Entry::Occupied(mut slot) => merge_into(slot.get_mut(), parsed),
            Entry::Vacant(slot) => {
                slot.insert(CanonicalRecord::from_parsed(parsed));
            }
        }
    }

    let mut merged: Vec<CanonicalRecord> = groups.into_values().collect();
    // `None < Some(_)` and the sort is stable.
    merged.sort_by(|a, b| a.date.cmp(&b.date));
    merged
}

/// Two-list form where `identifiers[i]` was parsed from `records[i]`.
pub fn dedupe_aligned(
    records: Vec<RawRecord>,
    identifiers: Vec<ScenarioIdentifier>,
) -> Result<Vec<CanonicalRecord>, MisalignedInput> {
    if records.len() != identifiers.len() {
        return Err(MisalignedInput {
            records: records.len(),
            identifiers: identifiers.len(),
        });
    }
    Ok(dedupe(
        records
            .into_iter()
            .zip(identifiers)
            .map(|(raw, scenario)| ParsedRecord::new(raw, scenario)),
    ))
}

fn merge_into(acc: &mut CanonicalRecord, parsed: ParsedRecord) {
    let ParsedRecord { raw, scenario } = parsed;

    acc.event_numbers.extend(raw.event_numbers);
    acc.participants.extend(raw.participants);
    acc.actor |= raw.actor;
    acc.facilitator |= raw.facilitator;

    if !acc.scenario.system.is_known() {
        acc.scenario.system = scenario.system;
    }

    acc.date = match (acc.date, raw.date) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (None, date) | (date, None) => date,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioParser;
    use chrono::{TimeZone, Utc};
    use playlog_model::GameSystem;
    use std::collections::BTreeMap;

    fn row(
        name: &str,
        day: Option<u32>,
        participant: i64,
        facilitator: bool,
    ) -> ParsedRecord {
        let (scenario, _) = ScenarioParser::default().parse_lossy(name);
        let raw = RawRecord {
            date: day
                .map(|d| Utc.with_ymd_and_hms(2020, 1, d, 0, 0, 0).unwrap()),
            event_numbers: vec![1000 + participant],
            participants: vec![participant],
            scenario_name: name.to_string(),
            actor: !facilitator,
            facilitator,
        };
        ParsedRecord::new(raw, scenario)
    }

    #[test]
    fn test_actor_and_facilitator_rows_merge() {
        let merged = dedupe(vec![
            row("#123-45: Test Scenario", Some(3), 11, false),
            row("#123-45: Test Scenario", Some(2), 22, true),
        ]);
        assert_eq!(merged.len(), 1);
        let record = &merged[0];
        assert_eq!(record.scenario.series, 123);
        assert_eq!(record.scenario.sequence, 45);
        assert!(record.actor && record.facilitator);
        assert_eq!(record.participants, vec![11, 22]);
        assert_eq!(record.event_numbers, vec![1011, 1022]);
        assert_eq!(
            record.date.map(|d| d.date_naive().to_string()).as_deref(),
            Some("2020-01-02")
        );
    }

    #[test]
    fn test_duplicate_ids_within_group_are_kept() {
        let merged = dedupe(vec![
            row("#1: Alpha", None, 5, false),
            row("#1: Alpha", None, 5, false),
        ]);
        assert_eq!(merged[0].participants, vec![5, 5]);
    }

    #[test]
    fn test_undated_first_then_ascending_ties_by_insertion() {
        let merged = dedupe(vec![
            row("#2: Late", Some(9), 1, false),
            row("#3: Tie A", Some(4), 1, false),
            row("Mystery", None, 1, false),
            row("#4: Tie B", Some(4), 1, false),
            row("#5: Early", Some(1), 1, false),
        ]);
        let names: Vec<_> = merged
            .iter()
            .map(|r| r.scenario.canonical_name.as_str())
            .collect();
        assert_eq!(names, vec!["Mystery", "Early", "Tie A", "Tie B", "Late"]);
    }

    #[test]
    fn test_system_filled_from_first_known() {
        let unknown = ParsedRecord::new(
            RawRecord::new("Shared"),
            ScenarioIdentifier::unnumbered(GameSystem::Unknown, "Shared"),
        );
        let starfinder = ParsedRecord::new(
            RawRecord::new("Shared"),
            ScenarioIdentifier::unnumbered(GameSystem::Starfinder, "Shared"),
        );
        let pathfinder = ParsedRecord::new(
            RawRecord::new("Shared"),
            ScenarioIdentifier::unnumbered(GameSystem::Pathfinder, "Shared"),
        );
        let merged = dedupe(vec![unknown, starfinder, pathfinder]);
        assert_eq!(merged[0].scenario.system, GameSystem::Starfinder);
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let once = dedupe(vec![
            row("#2-01: One", Some(5), 1, false),
            row("#2-02: Two", None, 2, true),
            row("#2-01: One", Some(3), 3, true),
            row("Crypt of the Everflame", Some(7), 4, false),
        ]);
        let twice = dedupe(once.iter().map(CanonicalRecord::to_parsed));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_groups_do_not_depend_on_input_order() {
        let rows = vec![
            row("#2-01: One", Some(5), 1, false),
            row("#2-02: Two", None, 2, true),
            row("#2-01: One", Some(3), 3, true),
            row("#2-02: Two", Some(8), 4, false),
        ];
        let summarize = |records: Vec<CanonicalRecord>| {
            records
                .into_iter()
                .map(|mut r| {
                    r.participants.sort();
                    r.event_numbers.sort();
                    (r.scenario.canonical_name.clone(), r)
                })
                .collect::<BTreeMap<_, _>>()
        };

        let forward = summarize(dedupe(rows.clone()));
        let backward = summarize(dedupe(rows.into_iter().rev()));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_aligned_form_checks_lengths() {
        let err = dedupe_aligned(vec![RawRecord::new("a")], vec![])
            .unwrap_err();
        assert_eq!(err.records, 1);
        assert_eq!(err.identifiers, 0);

        let merged = dedupe_aligned(
            vec![RawRecord::new("x"), RawRecord::new("x")],
            vec![
                ScenarioIdentifier::unnumbered(GameSystem::Unknown, "x"),
                ScenarioIdentifier::unnumbered(GameSystem::Unknown, "x"),
            ],
        )
        .unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(dedupe(Vec::new()).is_empty());
    }
}
