//! Todo entity and category policy

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category labels known out of the box
pub const DEFAULT_CATEGORIES: [&str; 3] = ["shopping", "learning", "hobby"];

/// One persisted todo record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier, assigned by the store on insert
    pub id: u64,

    /// What needs doing
    pub description: String,

    /// Label from the configured category set
    pub category: String,

    /// Completion flag, false for every new record
    pub done: bool,
}

/// Insert shape for a todo: exactly the fields a client submits
///
/// `id` and `done` never appear here. The store assigns the id and
/// materializes `done = false` when the record is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    /// What needs doing
    pub description: String,

    /// Label from the configured category set
    pub category: String,
}

impl NewTodo {
    /// Create an insert record
    pub fn new(description: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            category: category.into(),
        }
    }
}

/// Where category membership is enforced, if anywhere
///
/// Presence of a category is always required. Whether the label must also
/// belong to the configured set is a deployment decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryPolicy {
    /// Reject unknown categories in the HTTP handler with a client error
    #[default]
    Handler,

    /// Leave membership to the store's schema checks on insert
    Store,

    /// Check presence only, accept any label
    Off,
}

impl fmt::Display for CategoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Handler => "handler",
            Self::Store => "store",
            Self::Off => "off",
        };
        f.write_str(s)
    }
}

impl FromStr for CategoryPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "handler" => Ok(Self::Handler),
            "store" => Ok(Self::Store),
            "off" => Ok(Self::Off),
            other => Err(format!("unknown category policy '{other}'")),
        }
    }
}
