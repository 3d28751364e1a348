use std::fmt;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use playlog_core::model::{Credentials, JobId, JobRecord};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::parse_job_id;
use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

#[derive(Deserialize)]
pub struct CreateJobRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for CreateJobRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateJobRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub job_id: JobId,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobsQuery {
    /// Comma-separated job ids.
    #[serde(default)]
    pub ids: String,
}

pub async fn create_job_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> AppResult<(StatusCode, Json<CreateJobResponse>)> {
    let CreateJobRequest { email, password } = request;
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::bad_request("email and password are required"));
    }

    let job_id = state
        .jobs
        .create_job(Credentials::new(email.trim(), password))
        .await?;
    info!(job_id = %job_id, "Accepted collection job");
    Ok((StatusCode::ACCEPTED, Json(CreateJobResponse { job_id })))
}

pub async fn get_job_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<JobRecord>> {
    let id = parse_job_id(&id)?;
    state
        .jobs
        .get_job(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Job not found: {id}")))
}

/// Unknown or malformed ids are left out of the result.
pub async fn list_jobs_handler(
    State(state): State<AppState>,
    Query(query): Query<JobsQuery>,
) -> AppResult<Json<Vec<JobRecord>>> {
    let ids: Vec<JobId> = query
        .ids
        .split(',')
        .filter_map(|raw| JobId::parse(raw).ok())
        .collect();
    Ok(Json(state.jobs.get_jobs(&ids).await?))
}
