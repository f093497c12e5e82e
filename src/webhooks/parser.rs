//! Payload classifier.
//!
//! This module resolves raw webhook JSON into a typed [`Payload`] and the
//! flattened [`Classification`] the dispatcher routes on. The classifier is
//! total: it never fails, and any body it cannot place is unclassified.
//!
//! # Priority
//!
//! Payload shapes overlap (a body may carry both `actions` and
//! `type: "view_submission"`), so shapes are tried in a fixed order and the
//! first match wins:
//!
//! 1. `Event` - top-level `event`
//! 2. `Command` - top-level `command`
//! 3. `Options` - top-level `name`, or `type == "block_suggestion"`
//! 4. `Action` - top-level `actions`, or `type` is `dialog_submission` / `workflow_step_edit`
//! 5. `Shortcut` - `type` is `shortcut` or `message_action`
//! 6. `ViewAction` - `type` is `view_submission` or `view_closed`
//!
//! This order is part of the contract. It must not be inferred from which
//! fields happen to be absent in today's payloads.
//!
//! # Field rules
//!
//! - A key holding JSON `null` is treated as absent.
//! - Routing keys and conversation ids are only read from JSON strings; any
//!   other type is skipped, never an error.
//! - Empty conversation ids are treated as unresolved.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{ConversationId, RoutingKey};

use super::category::Category;
use super::events::{
    ActionKind, ActionPayload, CommandPayload, EventPayload, OptionsPayload, Payload,
    ShortcutKind, ShortcutPayload, ViewActionKind, ViewActionPayload,
};

/// The routing-relevant summary of a payload.
///
/// `category` is `None` for unrecognized shapes, in which case both other
/// fields are `None` as well.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Classification {
    pub category: Option<Category>,
    pub routing_key: Option<RoutingKey>,
    pub conversation_id: Option<ConversationId>,
}

impl Classification {
    /// The outcome for a body that matches no known shape.
    pub fn unclassified() -> Self {
        Self::default()
    }

    /// Returns true if the body matched one of the known shapes.
    pub fn is_classified(&self) -> bool {
        self.category.is_some()
    }
}

impl From<&Payload> for Classification {
    fn from(payload: &Payload) -> Self {
        Classification {
            category: Some(payload.category()),
            routing_key: payload.routing_key().cloned(),
            conversation_id: payload.conversation_id().cloned(),
        }
    }
}

/// Classifies a parsed webhook body.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use slack_dispatch::webhooks::{Category, classify};
///
/// let body = json!({ "event": { "type": "app_mention", "channel": "C123" } });
/// let result = classify(&body);
///
/// assert_eq!(result.category, Some(Category::Event));
/// assert_eq!(result.routing_key.unwrap().as_str(), "app_mention");
/// assert_eq!(result.conversation_id.unwrap().as_str(), "C123");
/// ```
pub fn classify(body: &Value) -> Classification {
    parse_payload(body)
        .as_ref()
        .map(Classification::from)
        .unwrap_or_else(Classification::unclassified)
}

/// A structural parse for one shape: matches and produces a variant, or
/// falls through.
type ShapeParser = fn(&Map<String, Value>) -> Option<Payload>;

/// Shape parsers in classification priority order.
const SHAPE_PRIORITY: [ShapeParser; 6] = [
    parse_event,
    parse_command,
    parse_options,
    parse_action,
    parse_shortcut,
    parse_view_action,
];

/// Parses a webhook body into its typed shape.
///
/// Returns `None` for non-object bodies and for objects matching no shape.
pub fn parse_payload(body: &Value) -> Option<Payload> {
    let object = body.as_object()?;
    SHAPE_PRIORITY.iter().find_map(|parse| parse(object))
}

// ============================================================================
// Shape parsers
// ============================================================================

fn parse_event(body: &Map<String, Value>) -> Option<Payload> {
    let event = field(body, "event")?;

    let (event_type, conversation_id) = match event.as_object() {
        Some(event) => (
            string_field(event, "type").map(RoutingKey::from),
            event_conversation(event),
        ),
        None => (None, None),
    };

    Some(Payload::Event(EventPayload {
        event_type,
        conversation_id,
    }))
}

/// Resolves the conversation of an inner event.
///
/// Precedence: `channel` as a string, then `channel.id`, then `channel_id`,
/// then `item.channel` (reaction and star events address a nested item).
/// Each step only counts if it yields a non-empty string.
fn event_conversation(event: &Map<String, Value>) -> Option<ConversationId> {
    let channel = field(event, "channel");

    channel
        .and_then(Value::as_str)
        .and_then(non_empty)
        .or_else(|| channel.and_then(|c| nested_str(c, "id")))
        .or_else(|| string_field(event, "channel_id").and_then(non_empty))
        .or_else(|| field(event, "item").and_then(|item| nested_str(item, "channel")))
        .map(ConversationId::from)
}

fn parse_command(body: &Map<String, Value>) -> Option<Payload> {
    let command = field(body, "command")?;

    Some(Payload::Command(CommandPayload {
        command: command.as_str().map(RoutingKey::from),
        conversation_id: string_field(body, "channel_id")
            .and_then(non_empty)
            .map(ConversationId::from),
    }))
}

fn parse_options(body: &Map<String, Value>) -> Option<Payload> {
    if field(body, "name").is_none() && type_field(body) != Some("block_suggestion") {
        return None;
    }

    Some(Payload::Options(OptionsPayload {
        conversation_id: channel_id(body),
    }))
}

fn parse_action(body: &Map<String, Value>) -> Option<Payload> {
    let kind = if field(body, "actions").is_some() {
        ActionKind::BlockActions
    } else {
        match type_field(body) {
            Some("dialog_submission") => ActionKind::DialogSubmission,
            Some("workflow_step_edit") => ActionKind::WorkflowStepEdit,
            _ => return None,
        }
    };

    Some(Payload::Action(ActionPayload {
        kind,
        callback_id: string_field(body, "callback_id").map(RoutingKey::from),
        conversation_id: channel_id(body),
    }))
}

fn parse_shortcut(body: &Map<String, Value>) -> Option<Payload> {
    let kind = match type_field(body)? {
        "shortcut" => ShortcutKind::Global,
        "message_action" => ShortcutKind::Message,
        _ => return None,
    };

    let conversation_id = match kind {
        ShortcutKind::Global => None,
        ShortcutKind::Message => channel_id(body),
    };

    Some(Payload::Shortcut(ShortcutPayload {
        kind,
        callback_id: string_field(body, "callback_id").map(RoutingKey::from),
        conversation_id,
    }))
}

fn parse_view_action(body: &Map<String, Value>) -> Option<Payload> {
    let kind = match type_field(body)? {
        "view_submission" => ViewActionKind::Submission,
        "view_closed" => ViewActionKind::Closed,
        _ => return None,
    };

    Some(Payload::ViewAction(ViewActionPayload {
        kind,
        callback_id: field(body, "view")
            .and_then(|view| view.get("callback_id"))
            .and_then(Value::as_str)
            .map(RoutingKey::from),
    }))
}

// ============================================================================
// Field access helpers
// ============================================================================

/// Returns a field's value, treating JSON `null` as absent.
fn field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|v| !v.is_null())
}

fn string_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    field(object, key).and_then(Value::as_str)
}

fn type_field(object: &Map<String, Value>) -> Option<&str> {
    string_field(object, "type")
}

/// Reads `value[key]` as a non-empty string. Non-object values yield `None`.
fn nested_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).and_then(non_empty)
}

/// Reads `body.channel.id`, the conversation location shared by interactive payloads.
fn channel_id(body: &Map<String, Value>) -> Option<ConversationId> {
    field(body, "channel")
        .and_then(|channel| nested_str(channel, "id"))
        .map(ConversationId::from)
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}
