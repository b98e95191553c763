//! Health check endpoint for liveness probes.
//!
//! Checks nothing beyond the process answering: credentials and upstreams
//! are read per request, so their absence shows on the requests that need
//! them (and on `/api/v1/credentials`).

use axum::http::StatusCode;

/// Returns 200 OK with the text "OK".
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
