pub mod jobs;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Create the API router
pub fn create_api_router() -> Router<AppState> {
    Router::new().nest("/api/jobs", jobs::create_jobs_router())
}

/// The complete application, ready to serve.
pub fn create_app_router(state: AppState) -> Router {
    create_api_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
