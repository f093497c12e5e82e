//! Handler for `app_mention` events.
//!
//! Replies in the conversation where the app was mentioned. Mentions whose
//! conversation cannot be resolved are acknowledged without a reply.

use serde_json::Value;
use tracing::debug;

use crate::slack::SlackClient;

use super::{HandlerError, HandlerResponse, RequestContext};

/// Handles an `app_mention` event.
pub async fn handle_app_mention(
    ctx: RequestContext,
    client: SlackClient,
    body: Value,
) -> Result<HandlerResponse, HandlerError> {
    let Some(channel) = ctx.classification.conversation_id.as_ref() else {
        debug!("app_mention without a conversation; nothing to reply to");
        return Ok(HandlerResponse::ok());
    };

    let user = body
        .pointer("/event/user")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty());

    client.post_message(channel, &reply_text(user)).await?;

    Ok(HandlerResponse::ok())
}

fn reply_text(user: Option<&str>) -> String {
    match user {
        Some(user) => format!("Hi <@{user}>, you rang?"),
        None => "Hi, you rang?".to_string(),
    }
}
