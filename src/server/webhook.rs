//! Slack events endpoint.
//!
//! Receives every inbound delivery (events, slash commands, interactions),
//! answers the URL-verification handshake, authenticates the request, and
//! hands it to the registered handler.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::webhooks::category_name;
use crate::webhooks::dispatch::DispatchOutcome;
use crate::webhooks::handlers::RequestContext;
use crate::webhooks::parser::classify;
use crate::webhooks::signature::{
    AuthenticationError, HEADER_SIGNATURE, HEADER_TIMESTAMP, authenticate,
};

/// Errors rejected before any handler runs.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Body is not JSON.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Signature or timestamp rejected.
    #[error("invalid request signature")]
    Unauthenticated(#[from] AuthenticationError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            WebhookError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        };

        (status, Json(json!({ "ok": false, "error": self.to_string() }))).into_response()
    }
}

/// Slack events handler.
///
/// # Response
///
/// - 200 OK: `{"challenge": ...}` for the URL-verification handshake, or the
///   handler's own response
/// - 400 Bad Request: body is not JSON, or the handler failed
/// - 401 Unauthorized: bad signature or stale timestamp
/// - 404 Not Found: `{"ok": false, "no_handler": true}`
/// - 500 Internal Server Error: the handler panicked
///
/// # Example
///
/// ```ignore
/// POST /slack/events HTTP/1.1
/// X-Slack-Signature: v0=...
/// X-Slack-Request-Timestamp: 1531420618
/// Content-Type: application/json
///
/// {"event": {"type": "app_mention", "channel": "C1", "user": "U1"}}
///
/// HTTP/1.1 200 OK
///
/// {"ok": true}
/// ```
pub async fn slack_events_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let body_json: Value = serde_json::from_slice(&body)?;

    // The handshake is answered before authentication.
    if let Some(challenge) = challenge(&body_json) {
        info!("Answering URL verification challenge");
        return Ok(Json(json!({ "challenge": challenge })).into_response());
    }

    if let Err(e) = authenticate(
        app_state.signing_secret(),
        get_header(&headers, HEADER_SIGNATURE),
        get_header(&headers, HEADER_TIMESTAMP),
        &body,
    ) {
        warn!(error = %e, "Rejected request");
        return Err(e.into());
    }

    let classification = classify(&body_json);
    let classified = classification.is_classified();
    let category = classification.category;
    let routing_key = classification.routing_key.clone();

    debug!(
        category = category_name(category),
        routing_key = routing_key.as_ref().map_or("", |k| k.as_str()),
        conversation_id = classification
            .conversation_id
            .as_ref()
            .map_or("", |c| c.as_str()),
        "Classified request"
    );

    let outcome = app_state
        .registry()
        .dispatch(
            category,
            routing_key.as_ref(),
            RequestContext::new(classification),
            app_state.slack().clone(),
            body_json,
        )
        .await;

    match &outcome {
        DispatchOutcome::Handled(response) => {
            debug!(status = %response.status, "Handler completed");
        }
        DispatchOutcome::Failed(e) => {
            warn!(
                category = category_name(category),
                error = %e,
                slack_error = e.slack_error_code(),
                "Handler failed"
            );
        }
        DispatchOutcome::NotFound => {
            warn!(
                classified,
                category = category_name(category),
                routing_key = routing_key.as_ref().map_or("", |k| k.as_str()),
                "No handler registered"
            );
        }
    }

    Ok(outcome.into_response())
}

/// Returns the handshake value, if the body carries the key. A `null` value
/// still counts.
fn challenge(body: &Value) -> Option<&Value> {
    body.get("challenge")
}

/// Extracts an optional header value as a string.
fn get_header<'a>(headers: &'a HeaderMap, name: &'static str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
