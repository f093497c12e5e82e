//! Handler for `app_home_opened` events.
//!
//! Publishes the App Home tab for the user who opened it.

use serde_json::{Value, json};

use crate::slack::SlackClient;
use crate::types::UserId;

use super::{HandlerError, HandlerResponse, RequestContext};

/// Handles an `app_home_opened` event.
///
/// # Errors
///
/// `MissingField("event.user")` if the event names no user, or the Slack
/// error if `views.publish` fails.
pub async fn handle_app_home_opened(
    _ctx: RequestContext,
    client: SlackClient,
    body: Value,
) -> Result<HandlerResponse, HandlerError> {
    let user = body
        .pointer("/event/user")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .map(UserId::from)
        .ok_or(HandlerError::MissingField("event.user"))?;

    client.publish_view(&user, &home_view(&user)).await?;

    Ok(HandlerResponse::ok())
}

/// The App Home view: one markdown section greeting the user.
fn home_view(user: &UserId) -> Value {
    json!({
        "type": "home",
        "blocks": [
            {
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": format!("Welcome to the app home, <@{user}>! :wave:")
                }
            }
        ]
    })
}
