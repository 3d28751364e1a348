use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use playlog_core::model::{CanonicalRecord, JobRecord, JobState};

use super::parse_job_id;
use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

const CSV_HEADER: [&str; 8] = [
    "Date",
    "Event Numbers",
    "Participants",
    "Series",
    "Sequence",
    "Variant",
    "Scenario",
    "Role",
];

/// Loads a job and hands back its records if it has finished.
async fn finished_records(
    state: &AppState,
    raw_id: &str,
) -> AppResult<(JobRecord, Vec<CanonicalRecord>)> {
    let id = parse_job_id(raw_id)?;
    let mut job = state
        .jobs
        .get_job(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Job not found: {id}")))?;

    match (job.state, job.records.take()) {
        (JobState::Done, Some(records)) => Ok((job, records)),
        (JobState::Error, _) => Err(AppError::conflict(
            "Job failed; there are no records to export",
        )),
        _ => Err(AppError::conflict(format!(
            "Job is still {}; records are available once it is done",
            job.state
        ))),
    }
}

fn join_numbers(values: &[i64]) -> String {
    values
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_csv(records: &[CanonicalRecord]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for record in records {
        let date = record
            .date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "MISSING".to_string());
        let (series, sequence) = if record.scenario.is_numbered() {
            (
                record.scenario.series.to_string(),
                record.scenario.sequence.to_string(),
            )
        } else {
            (String::new(), String::new())
        };

        writer.write_record([
            date.as_str(),
            join_numbers(&record.event_numbers).as_str(),
            join_numbers(&record.participants).as_str(),
            series.as_str(),
            sequence.as_str(),
            record.scenario.variant.as_str(),
            record.scenario.canonical_name.as_str(),
            record.role_label(),
        ])?;
    }

    writer.into_inner().context("failed to flush CSV output")
}

pub async fn records_csv_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let (job, records) = finished_records(&state, &id).await?;
    let body = render_csv(&records)?;
    let disposition = format!(
        "attachment; filename=\"playlog-{}.csv\"",
        &job.id.as_str()[..8]
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

pub async fn records_json_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<CanonicalRecord>>> {
    let (_, records) = finished_records(&state, &id).await?;
    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use playlog_core::model::{GameSystem, ScenarioIdentifier};

    fn record(scenario: ScenarioIdentifier) -> CanonicalRecord {
        CanonicalRecord {
            scenario,
            date: None,
            event_numbers: Vec::new(),
            participants: Vec::new(),
            actor: false,
            facilitator: false,
        }
    }

    #[test]
    fn csv_rows_follow_header_layout() {
        let mut numbered = record(
            ScenarioIdentifier::numbered(
                GameSystem::Pathfinder,
                5,
                8,
                "The Quest for Perfection, Part 1",
            )
            .with_variant("A"),
        );
        numbered.date =
            Some(Utc.with_ymd_and_hms(2014, 3, 2, 18, 0, 0).unwrap());
        numbered.event_numbers = vec![1001, 1002];
        numbered.participants = vec![701, 902];
        numbered.actor = true;
        numbered.facilitator = true;

        let mut module = record(ScenarioIdentifier::unnumbered(
            GameSystem::Pathfinder,
            "Emerald Spire",
        ));
        module.facilitator = true;

        let csv = String::from_utf8(render_csv(&[numbered, module]).unwrap())
            .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert_eq!(
            lines[1],
            "2014-03-02,1001 1002,701 902,5,8,A,\
             \"The Quest for Perfection, Part 1\",P/GM"
        );
        assert_eq!(lines[2], "MISSING,,,,,,Emerald Spire,GM");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_export_is_header_only() {
        let csv = String::from_utf8(render_csv(&[]).unwrap()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
