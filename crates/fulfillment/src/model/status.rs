use crate::model::Order;
use serde::{Deserialize, Serialize};
use sorting_robot::Cubby;
use std::fmt::Display;

/// Outcome of one processed item slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    Pending,
    Ready,
    Failed,
}

/// Aggregate status of an order.
///
/// Normally derived from the item statuses with [`OrderStatus::derive`]; only a manual
/// mark-fulfilled stores one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Ready,
    Failed,
}

impl OrderStatus {
    /// Derives the order status from the recorded item outcomes.
    ///
    /// * any `Failed` entry makes the order `Failed`;
    /// * no entries, or any `Pending` entry, keeps it `Pending`;
    /// * otherwise it is `Ready` once one `Ready` entry exists per item needing placement.
    ///
    /// ```
    /// use fulfillment::model::{ItemStatus, OrderStatus};
    ///
    /// assert_eq!(OrderStatus::derive(2, &[ItemStatus::Ready]), OrderStatus::Pending);
    /// assert_eq!(OrderStatus::derive(1, &[ItemStatus::Ready]), OrderStatus::Ready);
    /// ```
    pub fn derive(items_needed: usize, statuses: &[ItemStatus]) -> Self {
        if statuses.contains(&ItemStatus::Failed) {
            return OrderStatus::Failed;
        }
        if statuses.is_empty() || statuses.contains(&ItemStatus::Pending) {
            return OrderStatus::Pending;
        }
        if statuses.len() == items_needed {
            OrderStatus::Ready
        } else {
            OrderStatus::Pending
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Ready => "ready",
            OrderStatus::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// Snapshot of a stored order with its status already derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderData {
    pub order: Order,
    pub cubby: Cubby,
    pub item_statuses: Vec<ItemStatus>,
    pub status: OrderStatus,
}

/// What status queries return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentStatus {
    pub order: Order,
    pub cubby: Cubby,
    pub status: OrderStatus,
}

impl From<OrderData> for FulfillmentStatus {
    fn from(data: OrderData) -> Self {
        Self {
            order: data.order,
            cubby: data.cubby,
            status: data.status,
        }
    }
}
