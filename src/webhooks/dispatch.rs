//! Two-level dispatch table.
//!
//! Handlers are registered by `(Category, RoutingKey)` once at startup. The
//! built [`HandlerRegistry`] is immutable and shared read-only across requests,
//! so dispatch needs no locking.
//!
//! # Lookup
//!
//! 1. By category. An unclassified payload or a category with no table misses.
//! 2. By routing key within that category's table. An absent key is looked up
//!    as the empty string, so it only hits if a handler was registered under
//!    `""` for that category.
//!
//! A hit invokes exactly one handler exactly once; a miss invokes nothing.

use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::slack::SlackClient;
use crate::types::RoutingKey;

use super::category::{Category, category_name};
use super::handlers::{Handler, HandlerError, HandlerResponse, RequestContext};

/// Errors raised while building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("handler already registered for {category}/{routing_key:?}")]
    DuplicateHandler {
        category: Category,
        routing_key: RoutingKey,
    },
}

/// The result of dispatching one payload.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The handler ran and produced a response.
    Handled(HandlerResponse),
    /// The handler ran and failed (or panicked).
    Failed(HandlerError),
    /// No handler is registered for the category and key. Nothing ran.
    NotFound,
}

impl IntoResponse for DispatchOutcome {
    fn into_response(self) -> Response {
        match self {
            DispatchOutcome::Handled(response) => response.into_response(),
            DispatchOutcome::Failed(error) => error.into_response(),
            DispatchOutcome::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "ok": false, "no_handler": true })),
            )
                .into_response(),
        }
    }
}

type HandlerTable = HashMap<String, Arc<dyn Handler>>;

/// Immutable mapping `Category -> RoutingKey -> Handler`.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    tables: HashMap<Category, HandlerTable>,
}

/// Collects registrations and rejects duplicates.
#[derive(Default)]
pub struct RegistryBuilder {
    tables: HashMap<Category, HandlerTable>,
}

impl RegistryBuilder {
    /// Registers `handler` for `(category, routing_key)`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateHandler`] if the pair is already taken.
    pub fn register<H>(
        mut self,
        category: Category,
        routing_key: impl Into<RoutingKey>,
        handler: H,
    ) -> Result<Self, RegistryError>
    where
        H: Handler + 'static,
    {
        let routing_key = routing_key.into();
        match self
            .tables
            .entry(category)
            .or_default()
            .entry(routing_key.0.clone())
        {
            Entry::Occupied(_) => {
                return Err(RegistryError::DuplicateHandler {
                    category,
                    routing_key,
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(handler));
            }
        }
        Ok(self)
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            tables: self.tables,
        }
    }
}

impl HandlerRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// A registry with no handlers; every dispatch is `NotFound`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if a handler is registered for `(category, routing_key)`.
    pub fn contains(&self, category: Category, routing_key: &str) -> bool {
        self.lookup(Some(category), Some(routing_key)).is_some()
    }

    /// Total number of registered handlers across all categories.
    pub fn len(&self) -> usize {
        self.tables.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Routing keys registered under a category, in no particular order.
    pub fn keys(&self, category: Category) -> impl Iterator<Item = &str> {
        self.tables
            .get(&category)
            .into_iter()
            .flat_map(|table| table.keys().map(String::as_str))
    }

    fn lookup(
        &self,
        category: Option<Category>,
        routing_key: Option<&str>,
    ) -> Option<&Arc<dyn Handler>> {
        let table = self.tables.get(&category?)?;
        table.get(routing_key.unwrap_or(""))
    }

    /// Looks up and invokes the handler for `(category, routing_key)`.
    ///
    /// The handler's response or error is returned unmodified. A handler panic
    /// is caught here and reported as [`HandlerError::Panicked`]; the registry
    /// itself is never touched by a handler.
    pub async fn dispatch(
        &self,
        category: Option<Category>,
        routing_key: Option<&RoutingKey>,
        ctx: RequestContext,
        client: SlackClient,
        body: Value,
    ) -> DispatchOutcome {
        let Some(handler) = self.lookup(category, routing_key.map(RoutingKey::as_str)) else {
            return DispatchOutcome::NotFound;
        };

        debug!(
            category = category_name(category),
            routing_key = routing_key.map_or("", RoutingKey::as_str),
            "Invoking handler"
        );

        match AssertUnwindSafe(handler.handle(ctx, client, body))
            .catch_unwind()
            .await
        {
            Ok(Ok(response)) => DispatchOutcome::Handled(response),
            Ok(Err(error)) => DispatchOutcome::Failed(error),
            Err(panic) => DispatchOutcome::Failed(HandlerError::Panicked(panic_message(&*panic))),
        }
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for category in Category::ALL {
            let mut keys: Vec<_> = self.keys(category).collect();
            if !keys.is_empty() {
                keys.sort_unstable();
                map.entry(&category, &keys);
            }
        }
        map.finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
