//! Slack Web API error types.

use thiserror::Error;

/// Errors returned by [`SlackClient`](super::SlackClient) calls.
#[derive(Debug, Error)]
pub enum SlackError {
    /// The HTTP request could not be sent or did not complete.
    #[error("Slack request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The response was not the JSON envelope Slack returns.
    #[error("Slack response error: {0}")]
    Response(String),

    /// Slack answered with `{"ok": false, "error": ...}`.
    #[error("Slack API error in {method}: {error}")]
    Api { method: &'static str, error: String },
}

impl SlackError {
    /// Returns the Slack error code for API-level failures (e.g. `channel_not_found`).
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            SlackError::Api { error, .. } => Some(error),
            SlackError::Request(_) | SlackError::Response(_) => None,
        }
    }
}
