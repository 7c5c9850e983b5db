//! # Wire Types
//!
//! Plain data exchanged with the sorting robot. These are the only shapes that cross the
//! robot boundary, so they derive `Serialize`/`Deserialize` for whatever transport wraps them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// A physical unit the robot can pick up.
///
/// The `code` identifies the kind of item and is **not** unique: several units in the cargo
/// may share a code, and several orders may ask for the same code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub code: String,
    pub label: String,
}

impl Item {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

/// A storage slot the robot can drop the selected item into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cubby {
    pub id: String,
}

impl Cubby {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Display for Cubby {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cubby_{}", self.id)
    }
}

/// Snapshot of everything the robot currently holds.
///
/// `cubbies` is keyed by cubby id and lists items in the order they were placed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub remaining: Vec<Item>,
    pub selected: Option<Item>,
    pub cubbies: BTreeMap<String, Vec<Item>>,
}

impl AuditReport {
    /// Total number of items already placed into cubbies.
    pub fn placed(&self) -> usize {
        self.cubbies.values().map(Vec::len).sum()
    }
}
