//! HTTP client for the chat backend.
//!
//! Endpoints (all under `/api`):
//! - POST /login, POST /signup
//! - POST /upload, GET /documents, DELETE /documents/{filename}
//! - GET /metrics, GET /metrics/sessions/{session_id}

mod auth;
mod client;
mod documents;
mod metrics;

pub use client::ApiClient;
pub use documents::{validate_upload, ACCEPTED_EXTENSIONS};
