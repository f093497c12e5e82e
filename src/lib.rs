//! Slack Dispatch - an inbound request dispatcher for Slack apps.
//!
//! Authenticates Slack deliveries, classifies them into one of six payload
//! categories, and routes each to the handler registered for its
//! `(category, routing key)` pair.

pub mod config;
pub mod server;
pub mod slack;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
