//! Payload categories.
//!
//! Every inbound payload resolves to at most one [`Category`]. The category is
//! the first-level key of the dispatch table; the [`RoutingKey`] derived by the
//! parser is the second.
//!
//! [`RoutingKey`]: crate::types::RoutingKey

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of payload categories the platform delivers to one endpoint.
///
/// The declaration order is the naming order only. Classification priority is
/// defined by the parser, not by this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// An Events API callback (`{ "event": { "type": ... } }`).
    Event,
    /// A block action, dialog submission, or workflow step edit.
    Action,
    /// A slash command invocation.
    Command,
    /// An external select / block suggestion options request.
    Options,
    /// A modal submission or close.
    ViewAction,
    /// A global or message shortcut.
    Shortcut,
}

impl Category {
    /// All categories, in declaration order.
    pub const ALL: [Category; 6] = [
        Category::Event,
        Category::Action,
        Category::Command,
        Category::Options,
        Category::ViewAction,
        Category::Shortcut,
    ];

    /// Returns the stable identifier for this category.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Event => "Event",
            Category::Action => "Action",
            Category::Command => "Command",
            Category::Options => "Options",
            Category::ViewAction => "ViewAction",
            Category::Shortcut => "Shortcut",
        }
    }
}

/// Returns the identifier for a possibly-unclassified payload.
///
/// Unclassified payloads are named `"none"` rather than defaulting to any
/// real category.
pub fn category_name(category: Option<Category>) -> &'static str {
    category.map_or("none", |c| c.name())
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payload category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
