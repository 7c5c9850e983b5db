use crate::model::OrderId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),
    #[error("No order is awaiting item code: {0}")]
    NoDestination(String),
    #[error("Order already admitted: {0}")]
    DuplicateOrder(OrderId),
    #[error("No free cubby for order {order_id} after {probes} probes")]
    CapacityExhausted { order_id: OrderId, probes: u32 },
    #[error("State store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// True for the expected misses: unknown order, or nobody waiting for an item code.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::OrderNotFound(_) | StoreError::NoDestination(_)
        )
    }
}
