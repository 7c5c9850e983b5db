//! # Intake Queue
//!
//! The hand-off between the submission API and the single orchestrator loop. Submissions never
//! wait and are never refused while the loop is alive; the queue depth only picks the wording
//! of the acknowledgement.
//!
//! Completion is published through a `watch` channel carrying the sequence number of the last
//! fully processed batch. Batches complete in submission order, so waiting for batch `n` means
//! waiting until that value reaches `n`.

use crate::error::FulfillmentError;
use crate::model::{Order, SubmitAck};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// One submission, as pulled by the orchestrator.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Starts at 1 and increases by one per submission.
    pub sequence: u64,
    pub orders: Vec<Order>,
}

/// Shared between both ends. Sequence numbers are handed out and sent while this is locked,
/// so channel order and sequence order agree.
#[derive(Debug)]
struct QueueState {
    next_sequence: u64,
    depth: usize,
}

type SharedState = Arc<Mutex<QueueState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, QueueState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Creates a connected sender/receiver pair.
pub fn channel() -> (IntakeSender, IntakeReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let (completed_tx, completed_rx) = watch::channel(0);
    let state = Arc::new(Mutex::new(QueueState {
        next_sequence: 1,
        depth: 0,
    }));

    let intake_sender = IntakeSender {
        sender,
        state: state.clone(),
        completed: completed_rx,
    };
    let intake_receiver = IntakeReceiver {
        receiver,
        state,
        completed: completed_tx,
    };
    (intake_sender, intake_receiver)
}

/// Cloneable submission side of the queue.
#[derive(Debug, Clone)]
pub struct IntakeSender {
    sender: mpsc::UnboundedSender<Batch>,
    state: SharedState,
    completed: watch::Receiver<u64>,
}

impl IntakeSender {
    /// Enqueues a batch and acknowledges it.
    ///
    /// # Errors
    /// [`FulfillmentError::IntakeClosed`] once the receiving loop has gone away.
    pub fn submit(&self, orders: Vec<Order>) -> Result<SubmitAck, FulfillmentError> {
        let count = orders.len();
        let mut state = lock(&self.state);
        let sequence = state.next_sequence;
        let ahead = state.depth;

        self.sender
            .send(Batch { sequence, orders })
            .map_err(|_| FulfillmentError::IntakeClosed)?;
        state.next_sequence += 1;
        state.depth += 1;
        drop(state);

        debug!(batch = sequence, size = count, ahead, "Batch enqueued");
        Ok(SubmitAck::new(sequence, count, ahead))
    }

    /// Batches enqueued or in flight.
    pub fn depth(&self) -> usize {
        lock(&self.state).depth
    }

    /// Advisory: the loop had work when this was read.
    pub fn is_processing(&self) -> bool {
        self.depth() > 0
    }

    /// Sequence number of the last fully processed batch, 0 before the first.
    pub fn last_completed(&self) -> u64 {
        *self.completed.borrow()
    }

    /// Waits until batch `sequence` has been fully processed.
    ///
    /// # Errors
    /// [`FulfillmentError::IntakeClosed`] if the loop stops before getting there.
    pub async fn wait_for(&self, sequence: u64) -> Result<(), FulfillmentError> {
        let mut completed = self.completed.clone();
        completed
            .wait_for(|done| *done >= sequence)
            .await
            .map(|_| ())
            .map_err(|_| FulfillmentError::IntakeClosed)
    }
}

/// Consuming side, owned by the orchestrator loop.
#[derive(Debug)]
pub struct IntakeReceiver {
    receiver: mpsc::UnboundedReceiver<Batch>,
    state: SharedState,
    completed: watch::Sender<u64>,
}

impl IntakeReceiver {
    /// Next batch in submission order; `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<Batch> {
        self.receiver.recv().await
    }

    /// Marks `batch` as fully processed.
    pub fn complete(&self, batch: &Batch) {
        {
            let mut state = lock(&self.state);
            state.depth = state.depth.saturating_sub(1);
        }
        self.completed.send_replace(batch.sequence);
    }

    /// Refuses further submissions and drops whatever is still queued.
    ///
    /// Returns the number of batches dropped. Their waiters see
    /// [`FulfillmentError::IntakeClosed`] once the receiver is gone.
    pub fn close(&mut self) -> usize {
        let mut state = lock(&self.state);
        self.receiver.close();
        let mut dropped = 0;
        while self.receiver.try_recv().is_ok() {
            dropped += 1;
        }
        state.depth = 0;
        dropped
    }
}
