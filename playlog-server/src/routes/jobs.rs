use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    AppState,
    handlers::{
        events::{job_events_sse_handler, job_events_ws_handler},
        export::{records_csv_handler, records_json_handler},
        jobs::{create_job_handler, get_job_handler, list_jobs_handler},
    },
};

pub fn create_jobs_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_job_handler).get(list_jobs_handler))
        .route("/{id}", get(get_job_handler))
        .route("/{id}/events", get(job_events_sse_handler))
        .route("/{id}/ws", get(job_events_ws_handler))
        .route("/{id}/records.csv", get(records_csv_handler))
        .route("/{id}/records.json", get(records_json_handler))
}
