use serde::{Deserialize, Serialize};
use sorting_robot::Item;
use std::fmt::Display;

/// Type-safe identifier for Orders.
///
/// Ids are chosen by the submitting client and must be unique among active orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A customer order: the items that must all end up in one cubby.
///
/// Immutable once submitted. The same item code may appear several times, one entry per unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<Item>,
}

impl Order {
    pub fn new(id: impl Into<OrderId>, items: Vec<Item>) -> Self {
        Self {
            id: id.into(),
            items,
        }
    }
}
