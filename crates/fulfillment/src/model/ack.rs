use serde::{Deserialize, Serialize};

pub const HANDLED_IMMEDIATELY: &str = "The request will be handled immediately";
pub const QUEUED: &str = "Will start to process the request shortly";

/// Acknowledgement returned by a batch submission.
///
/// The message is advisory. It reflects the queue depth observed at submission time and never
/// changes whether the batch was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAck {
    /// Sequence number of the batch; usable with `FulfillmentService::wait_for_batch`.
    pub batch: u64,
    pub orders: usize,
    /// Batches queued or in flight ahead of this one.
    pub queued_ahead: usize,
    pub message: String,
}

impl SubmitAck {
    pub fn new(batch: u64, orders: usize, queued_ahead: usize) -> Self {
        let message = if queued_ahead == 0 {
            HANDLED_IMMEDIATELY
        } else {
            QUEUED
        };
        Self {
            batch,
            orders,
            queued_ahead,
            message: message.to_string(),
        }
    }

    pub fn is_immediate(&self) -> bool {
        self.queued_ahead == 0
    }
}
