//! Core domain types for the dispatcher.

pub mod ids;

pub use ids::{ConversationId, RoutingKey, UserId};
