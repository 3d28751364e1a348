//! # Playlog Server
//!
//! HTTP front end for the playlog collection engine. Clients submit
//! credentials, follow the resulting job over SSE or WebSocket, and export
//! the merged records as CSV or JSON once the job is done.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
