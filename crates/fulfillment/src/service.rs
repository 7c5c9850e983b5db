//! # Fulfillment Service
//!
//! The operations exposed to clients. A transport layer (gRPC, HTTP, ...) wraps this type; it
//! holds no state of its own beyond handles to the intake queue and the store, so it is cheap
//! to clone into every handler.

use crate::error::FulfillmentError;
use crate::intake::IntakeSender;
use crate::model::{FulfillmentStatus, Order, OrderId, OrderStatus, SubmitAck};
use crate::store::OrderStore;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct FulfillmentService {
    intake: IntakeSender,
    store: Arc<OrderStore>,
}

impl FulfillmentService {
    pub fn new(intake: IntakeSender, store: Arc<OrderStore>) -> Self {
        Self { intake, store }
    }

    /// Queues a batch for processing. Never waits for the robot.
    #[instrument(skip(self, orders), fields(size = orders.len()))]
    pub fn submit_orders(&self, orders: Vec<Order>) -> Result<SubmitAck, FulfillmentError> {
        let ack = self.intake.submit(orders)?;
        info!(batch = ack.batch, queued_ahead = ack.queued_ahead, "{}", ack.message);
        Ok(ack)
    }

    #[instrument(skip(self))]
    pub fn get_order_status(
        &self,
        order_id: &OrderId,
    ) -> Result<FulfillmentStatus, FulfillmentError> {
        Ok(self.store.get_order_data(order_id)?.into())
    }

    #[instrument(skip(self))]
    pub fn get_all_orders_status(&self) -> Result<Vec<FulfillmentStatus>, FulfillmentError> {
        Ok(self
            .store
            .get_all_orders_data()?
            .into_iter()
            .map(FulfillmentStatus::from)
            .collect())
    }

    /// Forces an order to `Ready`, whatever its items recorded.
    #[instrument(skip(self))]
    pub fn mark_fulfilled(&self, order_id: &OrderId) -> Result<(), FulfillmentError> {
        self.store
            .set_order_status_override(order_id, OrderStatus::Ready)?;
        Ok(())
    }

    /// Forgets every order and frees all cubbies, between processing cycles.
    #[instrument(skip(self))]
    pub fn reset(&self) -> Result<(), FulfillmentError> {
        self.store.clear()?;
        Ok(())
    }

    /// Waits until the batch acknowledged with `batch` has been fully processed.
    pub async fn wait_for_batch(&self, batch: u64) -> Result<(), FulfillmentError> {
        self.intake.wait_for(batch).await
    }

    /// Advisory hint; may be stale by the time it is read.
    pub fn is_processing(&self) -> bool {
        self.intake.is_processing()
    }
}
