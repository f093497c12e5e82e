//! Authenticated Slack Web API client.
//!
//! One `SlackClient` is built at startup from the bot token and handed to every
//! handler invocation. It is cheap to clone: the underlying `reqwest::Client`
//! shares its connection pool.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::types::{ConversationId, UserId};

use super::error::SlackError;

/// Default Slack Web API base URL.
pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// A Slack Web API client authenticated with a bot token.
#[derive(Clone)]
pub struct SlackClient {
    inner: Arc<SlackClientInner>,
}

struct SlackClientInner {
    http: reqwest::Client,
    bot_token: String,
    api_base: String,
}

/// The envelope every Web API method answers with.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    error: Option<String>,
    #[serde(flatten)]
    rest: serde_json::Map<String, Value>,
}

impl SlackClient {
    /// Creates a client against the public Slack API.
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self::with_api_base(bot_token, DEFAULT_API_BASE)
    }

    /// Creates a client against a specific API base URL.
    pub fn with_api_base(bot_token: impl Into<String>, api_base: impl Into<String>) -> Self {
        let api_base: String = api_base.into();
        SlackClient {
            inner: Arc::new(SlackClientInner {
                http: reqwest::Client::new(),
                bot_token: bot_token.into(),
                api_base: api_base.trim_end_matches('/').to_string(),
            }),
        }
    }

    /// Returns the API base URL this client calls.
    pub fn api_base(&self) -> &str {
        &self.inner.api_base
    }

    /// Posts a plain-text message to a conversation (`chat.postMessage`).
    ///
    /// Returns the message timestamp on success.
    #[instrument(skip_all, fields(channel = %channel))]
    pub async fn post_message(
        &self,
        channel: &ConversationId,
        text: &str,
    ) -> Result<Option<String>, SlackError> {
        let body = json!({ "channel": channel.as_str(), "text": text });
        let result = self.call("chat.postMessage", &body).await?;
        let ts = result.get("ts").and_then(Value::as_str).map(String::from);

        debug!(ts = ?ts, "Message posted to Slack");
        Ok(ts)
    }

    /// Publishes a view to a user's App Home tab (`views.publish`).
    #[instrument(skip_all, fields(user = %user_id))]
    pub async fn publish_view(&self, user_id: &UserId, view: &Value) -> Result<(), SlackError> {
        let body = json!({ "user_id": user_id.as_str(), "view": view });
        self.call("views.publish", &body).await?;

        debug!("Home view published");
        Ok(())
    }

    /// Calls a Web API method with a JSON body and unwraps Slack's `ok` envelope.
    async fn call(
        &self,
        method: &'static str,
        body: &Value,
    ) -> Result<serde_json::Map<String, Value>, SlackError> {
        let response = self
            .inner
            .http
            .post(format!("{}/{method}", self.inner.api_base))
            .bearer_auth(&self.inner.bot_token)
            .json(body)
            .send()
            .await
            .map_err(SlackError::Request)?;

        let status = response.status();
        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| SlackError::Response(format!("{method} (HTTP {status}): {e}")))?;

        if !envelope.ok {
            let error = envelope.error.unwrap_or_else(|| "unknown_error".to_string());
            warn!(method, error = %error, "Slack API returned an error");
            return Err(SlackError::Api { method, error });
        }

        Ok(envelope.rest)
    }
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("api_base", &self.inner.api_base)
            .field("bot_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
