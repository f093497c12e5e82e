//! Slack Web API access for handlers.
//!
//! Handlers receive a [`SlackClient`] already authenticated with the bot token.
//! Calls are made once; there is no retry layer.

pub mod client;
pub mod error;

pub use client::{DEFAULT_API_BASE, SlackClient};
pub use error::SlackError;
