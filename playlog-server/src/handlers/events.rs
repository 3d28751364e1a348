//! Live job status over SSE and WebSocket.
//!
//! Both transports replay stored events newer than `since` and then follow
//! the job until it reaches a terminal state.

use std::time::Duration;

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::{
        Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt, future};
use playlog_core::StatusEventStream;
use playlog_core::model::StatusEvent;
use serde::Deserialize;
use tracing::{debug, warn};

use super::parse_job_id;
use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub since: Option<DateTime<Utc>>,
}

async fn open_stream(
    state: &AppState,
    raw_id: &str,
    since: Option<DateTime<Utc>>,
) -> AppResult<StatusEventStream> {
    let id = parse_job_id(raw_id)?;
    state
        .jobs
        .subscribe_to_job(&id, since)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Job not found: {id}")))
}

fn last_event_id(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("last-event-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

fn status_event_to_sse(event: &StatusEvent) -> Result<Event, anyhow::Error> {
    Ok(Event::default()
        .id(event.sequence.to_string())
        .event("status")
        .json_data(event)?)
}

pub async fn job_events_sse_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<EventsQuery>,
    headers: HeaderMap,
) -> AppResult<Sse<impl Stream<Item = Result<Event, anyhow::Error>>>> {
    let resume_after = last_event_id(&headers);
    let events = open_stream(&state, &id, query.since).await?;

    let stream = events
        .filter(move |event| {
            future::ready(resume_after.is_none_or(|last| event.sequence > last))
        })
        .map(|event| status_event_to_sse(&event));

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keepalive"),
    ))
}

pub async fn job_events_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> AppResult<Response> {
    let events = open_stream(&state, &id, query.since).await?;
    Ok(ws.on_upgrade(move |socket| forward_events(socket, events)))
}

/// One JSON text frame per event, then a close frame.
async fn forward_events(mut socket: WebSocket, mut events: StatusEventStream) {
    while let Some(event) = events.next().await {
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(
                    job_id = %event.job_id,
                    "Failed to encode status event: {err}"
                );
                continue;
            }
        };
        if socket.send(Message::Text(payload.into())).await.is_err() {
            debug!(job_id = %event.job_id, "WebSocket client went away");
            return;
        }
    }
    let _ = socket.send(Message::Close(None)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn last_event_id_parses_sequence() {
        let mut headers = HeaderMap::new();
        assert_eq!(last_event_id(&headers), None);
        headers.insert("last-event-id", HeaderValue::from_static(" 7 "));
        assert_eq!(last_event_id(&headers), Some(7));
        headers.insert("last-event-id", HeaderValue::from_static("seven"));
        assert_eq!(last_event_id(&headers), None);
    }
}
