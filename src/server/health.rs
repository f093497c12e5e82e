//! Liveness and landing endpoints.

use axum::http::StatusCode;

/// Health check handler.
///
/// Returns 200 OK with the text "OK" for load balancers and liveness probes.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Landing page for `GET /`.
pub async fn root_handler() -> &'static str {
    "Slack dispatcher is running. Point your app's request URL at /slack/events."
}
