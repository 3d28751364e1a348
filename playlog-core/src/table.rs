//! Decoding of tabular session listings into [`RawRecord`]s.
//!
//! A malformed field never drops its row: the field falls back to a
//! sentinel and an issue string is reported alongside the record.

use chrono::{DateTime, NaiveDate, Utc};
use playlog_model::RawRecord;
use serde::{Deserialize, Serialize};

/// Cell offsets within one listing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub date: usize,
    pub scenario: usize,
    pub event: usize,
    /// `<player>-<character>` for player rows; the character part is the
    /// participant id.
    pub participant: usize,
    /// Contains `GM` on facilitator rows.
    pub role: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            date: 0,
            scenario: 2,
            event: 4,
            participant: 7,
            role: 10,
        }
    }
}

impl ColumnLayout {
    /// Minimum number of cells a row needs to be decoded.
    pub fn width(&self) -> usize {
        [
            self.date,
            self.scenario,
            self.event,
            self.participant,
            self.role,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRow {
    pub record: RawRecord,
    pub issues: Vec<String>,
}

/// Decodes one row, or `None` if it is too short to be a session row.
pub fn decode_row(
    layout: &ColumnLayout,
    cells: &[String],
) -> Option<DecodedRow> {
    if cells.len() < layout.width() {
        return None;
    }

    let cell = |index: usize| cells[index].trim();
    let mut issues = Vec::new();
    let mut record = RawRecord::new(cell(layout.scenario));

    record.date = parse_date(cell(layout.date)).unwrap_or_else(|issue| {
        issues.push(issue);
        None
    });

    let event = cell(layout.event);
    match event.parse::<i64>() {
        Ok(number) => record.event_numbers.push(number),
        Err(err) => issues.push(format!(
            "could not parse event number {event:?}: {err}"
        )),
    }

    record.facilitator = cell(layout.role).contains("GM");
    record.actor = !record.facilitator;

    let participant = cell(layout.participant);
    if record.facilitator {
        if let Some(id) = character_number(participant)
            .and_then(|text| text.parse::<i64>().ok())
        {
            record.participants.push(id);
        }
    } else {
        match character_number(participant) {
            None => {
                issues.push(format!(
                    "expected participant {participant:?} to be \
                     <player>-<character>"
                ));
                record.participants.push(0);
            }
            Some("") => record.participants.push(0),
            Some(text) => match text.parse::<i64>() {
                Ok(id) => record.participants.push(id),
                Err(err) => {
                    issues.push(format!(
                        "could not parse character number {text:?}: {err}"
                    ));
                    record.participants.push(0);
                }
            },
        }
    }

    Some(DecodedRow { record, issues })
}

fn character_number(cell: &str) -> Option<&str> {
    cell.split_once('-').map(|(_, character)| character.trim())
}

/// Empty cells are undated without complaint. RFC 3339 timestamps and
/// plain `YYYY-MM-DD` / `MM/DD/YYYY` dates are accepted.
fn parse_date(cell: &str) -> Result<Option<DateTime<Utc>>, String> {
    if cell.is_empty() {
        return Ok(None);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(cell) {
        return Ok(Some(stamp.with_timezone(&Utc)));
    }
    ["%Y-%m-%d", "%m/%d/%Y"]
        .into_iter()
        .find_map(|format| NaiveDate::parse_from_str(cell, format).ok())
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|stamp| Some(stamp.and_utc()))
        .ok_or_else(|| format!("could not parse date {cell:?}"))
}
