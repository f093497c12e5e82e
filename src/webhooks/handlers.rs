//! Business handlers for classified payloads.
//!
//! A handler receives the per-request context, the authenticated Slack client,
//! and the full parsed body, and produces a JSON response. The dispatcher returns
//! that response unmodified.
//!
//! A handler that returns an error answers 400 with the error message. A
//! handler that panics answers 500 with the panic message instead: a panic is
//! a bug in the handler, not a problem with the request.
//!
//! # Built-in handlers
//!
//! | Category | Routing key | Handler |
//! |----------|-------------|---------|
//! | `Event` | `app_mention` | `handle_app_mention` - replies in the mentioning conversation |
//! | `Event` | `app_home_opened` | `handle_app_home_opened` - publishes the App Home view |

mod app_home_opened;
mod app_mention;

use std::future::Future;

use async_trait::async_trait;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use thiserror::Error;

use crate::slack::{SlackClient, SlackError};

use super::category::Category;
use super::dispatch::{HandlerRegistry, RegistryError};
use super::parser::Classification;

pub use app_home_opened::handle_app_home_opened;
pub use app_mention::handle_app_mention;

/// Per-request context handed to a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// How the body was classified, including the best-effort conversation.
    pub classification: Classification,

    /// When the request was received.
    pub received_at: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(classification: Classification) -> Self {
        RequestContext {
            classification,
            received_at: Utc::now(),
        }
    }
}

/// A handler's HTTP response: a status code and a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl HandlerResponse {
    /// `200 {"ok": true}`.
    pub fn ok() -> Self {
        Self::json(StatusCode::OK, json!({ "ok": true }))
    }

    pub fn json(status: StatusCode, body: Value) -> Self {
        HandlerResponse { status, body }
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Errors a handler can fail with.
///
/// The dispatcher turns these into `{"ok": false, "error": <message>}`.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The body lacks a field this handler needs.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// An outbound Slack call failed.
    #[error(transparent)]
    Slack(#[from] SlackError),

    /// Handler-specific failure.
    #[error("{0}")]
    Failed(String),

    /// The handler panicked. Caught at the dispatch boundary.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Status code for the error response.
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Panicked(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HandlerError::MissingField(_) | HandlerError::Slack(_) | HandlerError::Failed(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    /// The Slack error code behind this failure, if an outbound call was
    /// rejected by the Web API.
    pub fn slack_error_code(&self) -> Option<&str> {
        match self {
            HandlerError::Slack(e) => e.api_error_code(),
            _ => None,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "ok": false, "error": self.to_string() }))).into_response()
    }
}

/// A business handler.
///
/// Any `Fn(RequestContext, SlackClient, Value) -> impl Future<Output = Result<HandlerResponse, HandlerError>>`
/// is a handler, including plain `async fn` items.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(
        &self,
        ctx: RequestContext,
        client: SlackClient,
        body: Value,
    ) -> Result<HandlerResponse, HandlerError>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(RequestContext, SlackClient, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HandlerResponse, HandlerError>> + Send + 'static,
{
    async fn handle(
        &self,
        ctx: RequestContext,
        client: SlackClient,
        body: Value,
    ) -> Result<HandlerResponse, HandlerError> {
        self(ctx, client, body).await
    }
}

/// Builds the registry of built-in handlers.
pub fn default_registry() -> Result<HandlerRegistry, RegistryError> {
    Ok(HandlerRegistry::builder()
        .register(Category::Event, "app_mention", handle_app_mention)?
        .register(Category::Event, "app_home_opened", handle_app_home_opened)?
        .build())
}
