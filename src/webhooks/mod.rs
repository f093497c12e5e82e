//! Inbound webhook processing.
//!
//! This module provides:
//! - Signature verification for request bodies (HMAC-SHA256 plus a replay window)
//! - Classification of raw JSON into one of six payload categories
//! - A two-level `(category, routing key)` dispatch table and built-in handlers

pub mod category;
pub mod dispatch;
pub mod events;
pub mod handlers;
pub mod parser;
pub mod signature;

pub use category::{Category, category_name};
pub use dispatch::{DispatchOutcome, HandlerRegistry, RegistryBuilder, RegistryError};
pub use events::Payload;
pub use handlers::{Handler, HandlerError, HandlerResponse, RequestContext, default_registry};
pub use parser::{Classification, classify, parse_payload};
pub use signature::{AuthenticationError, authenticate, verify};
