//! Typed payload shapes.
//!
//! The platform delivers six structurally overlapping JSON shapes to a single
//! endpoint. The parser resolves each body to one [`Payload`] variant carrying
//! only what routing needs: the routing key and the conversation, if any.
//! Handlers still receive the full parsed body.

use serde::Serialize;

use crate::types::{ConversationId, RoutingKey};

use super::category::Category;

/// A classified inbound payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Payload {
    /// Events API callback.
    Event(EventPayload),
    /// Slash command.
    Command(CommandPayload),
    /// Options (external select) request.
    Options(OptionsPayload),
    /// Block action, dialog submission, or workflow step edit.
    Action(ActionPayload),
    /// Global or message shortcut.
    Shortcut(ShortcutPayload),
    /// Modal submission or close.
    ViewAction(ViewActionPayload),
}

impl Payload {
    /// Returns the dispatch category for this payload.
    pub fn category(&self) -> Category {
        match self {
            Payload::Event(_) => Category::Event,
            Payload::Command(_) => Category::Command,
            Payload::Options(_) => Category::Options,
            Payload::Action(_) => Category::Action,
            Payload::Shortcut(_) => Category::Shortcut,
            Payload::ViewAction(_) => Category::ViewAction,
        }
    }

    /// Returns the second-level dispatch key, if the shape carries one.
    pub fn routing_key(&self) -> Option<&RoutingKey> {
        match self {
            Payload::Event(e) => e.event_type.as_ref(),
            Payload::Command(c) => c.command.as_ref(),
            Payload::Options(_) => None,
            Payload::Action(a) => a.callback_id.as_ref(),
            Payload::Shortcut(s) => s.callback_id.as_ref(),
            Payload::ViewAction(v) => v.callback_id.as_ref(),
        }
    }

    /// Returns the conversation the payload originated in, if known.
    pub fn conversation_id(&self) -> Option<&ConversationId> {
        match self {
            Payload::Event(e) => e.conversation_id.as_ref(),
            Payload::Command(c) => c.conversation_id.as_ref(),
            Payload::Options(o) => o.conversation_id.as_ref(),
            Payload::Action(a) => a.conversation_id.as_ref(),
            Payload::Shortcut(s) => s.conversation_id.as_ref(),
            Payload::ViewAction(_) => None,
        }
    }
}

/// An Events API callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventPayload {
    /// The inner `event.type` (e.g. `app_mention`).
    pub event_type: Option<RoutingKey>,

    /// Resolved from `event.channel`, `event.channel.id`, `event.channel_id`,
    /// or `event.item.channel`, in that order.
    pub conversation_id: Option<ConversationId>,
}

/// A slash command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandPayload {
    /// The command text including its slash (e.g. `/deploy`).
    pub command: Option<RoutingKey>,

    /// From `channel_id`.
    pub conversation_id: Option<ConversationId>,
}

/// An options request for an external select menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionsPayload {
    /// From `channel.id`.
    pub conversation_id: Option<ConversationId>,
}

/// Why a body was classified as an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Body carries an `actions` array (block or attachment actions).
    BlockActions,
    /// Legacy dialog submission.
    DialogSubmission,
    /// Workflow step configuration opened.
    WorkflowStepEdit,
}

/// An interactive-component action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionPayload {
    pub kind: ActionKind,

    /// From the top-level `callback_id`.
    pub callback_id: Option<RoutingKey>,

    /// From `channel.id`.
    pub conversation_id: Option<ConversationId>,
}

/// Which surface a shortcut was invoked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutKind {
    /// `type: "shortcut"`, invoked from the composer or search. No conversation.
    Global,
    /// `type: "message_action"`, invoked on a message.
    Message,
}

/// A global or message shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortcutPayload {
    pub kind: ShortcutKind,
    pub callback_id: Option<RoutingKey>,

    /// Always `None` for global shortcuts.
    pub conversation_id: Option<ConversationId>,
}

/// What happened to the modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewActionKind {
    Submission,
    Closed,
}

/// A modal submission or close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewActionPayload {
    pub kind: ViewActionKind,

    /// From `view.callback_id`.
    pub callback_id: Option<RoutingKey>,
}
