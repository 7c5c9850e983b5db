//! # Fulfillment Orchestrator
//!
//! Drains the intake queue one batch at a time and drives the robot through the per-item
//! protocol:
//!
//! 1. admit the batch into the [`OrderStore`];
//! 2. for every admitted order, once per declared item slot:
//!    * ask the robot for an item (`select_item`);
//!    * pop the oldest destination waiting for that item's code;
//!    * move the item into the destination cubby and record the outcome against the
//!      destination's order.
//!
//! The robot is used strictly sequentially and owned by this loop alone. Every robot call is
//! bounded by a timeout, and the cancellation signal is checked between item slots, never in the
//! middle of a call.

use crate::config::FulfillmentConfig;
use crate::error::FulfillmentError;
use crate::intake::{Batch, IntakeReceiver};
use crate::model::{ItemStatus, OrderId};
use crate::store::{AdmittedOrder, OrderStore, RejectedOrder};
use sorting_robot::{Cubby, RobotError, SortingRobot};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// What happened to one admitted order during its batch.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderOutcome {
    pub order_id: OrderId,
    pub cubby: Cubby,
    /// Items moved into some order's cubby while this order's slots were processed.
    pub placed: usize,
    /// Items the robot offered that nobody was waiting for.
    pub misses: usize,
    /// Why the remaining slots were abandoned, if they were.
    pub error: Option<FulfillmentError>,
}

impl OrderOutcome {
    fn new(admitted: &AdmittedOrder) -> Self {
        Self {
            order_id: admitted.order.id.clone(),
            cubby: admitted.cubby.clone(),
            placed: 0,
            misses: 0,
            error: None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.error.is_some()
    }
}

/// Summary of one processed batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub sequence: u64,
    pub rejected: Vec<RejectedOrder>,
    pub outcomes: Vec<OrderOutcome>,
    /// The cancellation signal stopped the batch early.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn placed(&self) -> usize {
        self.outcomes.iter().map(|o| o.placed).sum()
    }

    pub fn misses(&self) -> usize {
        self.outcomes.iter().map(|o| o.misses).sum()
    }

    pub fn aborted(&self) -> impl Iterator<Item = &OrderOutcome> {
        self.outcomes.iter().filter(|o| o.is_aborted())
    }
}

enum SlotResult {
    Placed,
    Unwanted,
}

fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    // A dropped sender counts as cancellation
    let _ = cancel.wait_for(|stop| *stop).await;
}

pub struct Orchestrator<R> {
    robot: R,
    store: Arc<OrderStore>,
    call_timeout: Duration,
    reject_cubby: Option<Cubby>,
}

impl<R: SortingRobot> Orchestrator<R> {
    pub fn new(robot: R, store: Arc<OrderStore>, config: &FulfillmentConfig) -> Self {
        Self {
            robot,
            store,
            call_timeout: config.robot_call_timeout(),
            reject_cubby: config.reject_cubby.as_deref().map(Cubby::new),
        }
    }

    /// Runs the processing loop until cancelled or until every intake sender is gone.
    ///
    /// A batch that is cut short by cancellation is still marked complete so waiters wake up.
    pub async fn run(self, mut intake: IntakeReceiver, mut cancel: watch::Receiver<bool>) {
        info!("Orchestrator started");
        let mut batches = 0u64;

        loop {
            let batch = tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => break,
                batch = intake.next() => match batch {
                    Some(batch) => batch,
                    None => break,
                },
            };

            let report = self.process_batch(&batch, &cancel).await;
            intake.complete(&batch);
            batches += 1;
            if report.cancelled {
                break;
            }
        }

        let dropped = intake.close();
        info!(batches, dropped, "Orchestrator shutdown");
    }

    /// Admits and processes one batch to completion (or until cancelled).
    pub async fn process_batch(
        &self,
        batch: &Batch,
        cancel: &watch::Receiver<bool>,
    ) -> BatchReport {
        let span = info_span!("batch", batch = batch.sequence, size = batch.orders.len());
        async move {
            let mut report = BatchReport {
                sequence: batch.sequence,
                ..BatchReport::default()
            };

            let admission = match self.store.add_orders(batch.orders.clone()) {
                Ok(admission) => admission,
                Err(e) => {
                    error!(error = %e, "Batch admission failed");
                    report.rejected = batch
                        .orders
                        .iter()
                        .map(|order| RejectedOrder {
                            order_id: order.id.clone(),
                            error: e.clone(),
                        })
                        .collect();
                    return report;
                }
            };
            report.rejected = admission.rejected;

            for admitted in &admission.admitted {
                if is_cancelled(cancel) {
                    report.cancelled = true;
                    break;
                }
                let outcome = self.fulfill_order(admitted, cancel).await;
                if matches!(outcome.error, Some(FulfillmentError::Cancelled)) {
                    report.cancelled = true;
                }
                report.outcomes.push(outcome);
                if report.cancelled {
                    break;
                }
            }

            info!(
                orders = report.outcomes.len(),
                rejected = report.rejected.len(),
                placed = report.placed(),
                misses = report.misses(),
                aborted = report.aborted().count(),
                cancelled = report.cancelled,
                "Batch processed"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn fulfill_order(
        &self,
        admitted: &AdmittedOrder,
        cancel: &watch::Receiver<bool>,
    ) -> OrderOutcome {
        let mut outcome = OrderOutcome::new(admitted);
        let order_id = &admitted.order.id;

        for slot in 0..admitted.order.items.len() {
            if is_cancelled(cancel) {
                warn!(order_id = %order_id, slot, "Order interrupted by shutdown");
                outcome.error = Some(FulfillmentError::Cancelled);
                break;
            }

            match self.fulfill_slot(order_id).await {
                Ok(SlotResult::Placed) => outcome.placed += 1,
                Ok(SlotResult::Unwanted) => outcome.misses += 1,
                Err(e) => {
                    if e.is_robot() {
                        warn!(order_id = %order_id, slot, error = %e, "Order aborted by robot failure");
                    } else {
                        error!(order_id = %order_id, slot, error = %e, "Order aborted");
                    }
                    outcome.error = Some(e);
                    break;
                }
            }
        }

        debug!(
            order_id = %order_id,
            placed = outcome.placed,
            misses = outcome.misses,
            "Order processed"
        );
        outcome
    }

    async fn fulfill_slot(&self, order_id: &OrderId) -> Result<SlotResult, FulfillmentError> {
        let item = match self.call("select_item", self.robot.select_item()).await {
            Ok(item) => item,
            Err(e) => {
                self.record(order_id, ItemStatus::Failed);
                return Err(e);
            }
        };

        let destination = match self.store.pop_destination_for_item_code(&item.code) {
            Ok(destination) => destination,
            Err(e) if e.is_not_found() => {
                warn!(code = %item.code, "Robot offered an item nobody is waiting for");
                self.discard(order_id).await?;
                return Ok(SlotResult::Unwanted);
            }
            Err(e) => return Err(e.into()),
        };

        let cubby = destination.cubby.clone();
        match self.call("move_item", self.robot.move_item(cubby)).await {
            Ok(()) => {
                self.record(&destination.order_id, ItemStatus::Ready);
                debug!(
                    code = %item.code,
                    order_id = %destination.order_id,
                    cubby = %destination.cubby,
                    "Item placed"
                );
                Ok(SlotResult::Placed)
            }
            Err(e) => {
                self.record(&destination.order_id, ItemStatus::Failed);
                Err(e)
            }
        }
    }

    /// Releases an unwanted item into the reject cubby. With the reject cubby disabled the
    /// robot keeps holding the item and its next selection fails.
    async fn discard(&self, order_id: &OrderId) -> Result<(), FulfillmentError> {
        let Some(reject) = self.reject_cubby.clone() else {
            warn!(order_id = %order_id, "No reject cubby configured, item stays in the gripper");
            return Ok(());
        };
        match self.call("move_item", self.robot.move_item(reject)).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.record(order_id, ItemStatus::Failed);
                Err(e)
            }
        }
    }

    fn record(&self, order_id: &OrderId, status: ItemStatus) {
        match self.store.record_item_status(order_id, status) {
            Ok(order_status) => {
                debug!(order_id = %order_id, ?status, %order_status, "Item status recorded")
            }
            // The store may have been reset while the batch was running
            Err(e) => warn!(order_id = %order_id, error = %e, "Item status not recorded"),
        }
    }

    async fn call<T>(
        &self,
        operation: &'static str,
        request: impl Future<Output = Result<T, RobotError>>,
    ) -> Result<T, FulfillmentError> {
        match tokio::time::timeout(self.call_timeout, request).await {
            Ok(result) => result.map_err(FulfillmentError::from),
            Err(_) => Err(FulfillmentError::RobotTimeout {
                operation,
                timeout_ms: self.call_timeout.as_millis() as u64,
            }),
        }
    }
}
