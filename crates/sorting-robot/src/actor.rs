//! # Simulated Sorting Robot
//!
//! This module defines the `RobotActor`, an in-process stand-in for the physical sorter.
//! It owns the cargo, the currently held item and the contents of every cubby, and processes
//! requests sequentially so the robot's one-item-at-a-time rule holds without any locking.

use crate::client::RobotClient;
use crate::error::RobotError;
use crate::message::RobotRequest;
use crate::model::{AuditReport, Cubby, Item};
use std::collections::{BTreeMap, VecDeque};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The actor serving [`RobotRequest`]s.
///
/// # Behavior
///
/// * **LoadItems** appends to the cargo.
/// * **SelectItem** takes the oldest item from the cargo and holds it. Selection is FIFO so
///   runs are reproducible.
/// * **MoveItem** places the held item into the given cubby and releases it.
/// * **AuditState** returns a snapshot of cargo, held item and cubby contents.
///
/// # Usage Pattern
///
/// 1.  **Create**: `RobotActor::new()` returns the actor and a [`RobotClient`].
/// 2.  **Run**: spawn `actor.run()` in a background task.
/// 3.  **Stop**: drop every client; the loop exits once the channel closes.
pub struct RobotActor {
    receiver: mpsc::Receiver<RobotRequest>,
    cargo: VecDeque<Item>,
    selected: Option<Item>,
    cubbies: BTreeMap<String, Vec<Item>>,
}

impl RobotActor {
    /// Creates a new `RobotActor` and its associated `RobotClient`.
    ///
    /// `buffer_size` is the capacity of the request channel; callers wait when it is full.
    pub fn new(buffer_size: usize) -> (Self, RobotClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            cargo: VecDeque::new(),
            selected: None,
            cubbies: BTreeMap::new(),
        };
        (actor, RobotClient::new(sender))
    }

    /// Runs the request loop until every client has been dropped.
    pub async fn run(mut self) {
        info!("Robot started");

        while let Some(request) = self.receiver.recv().await {
            let operation = request.operation();
            match request {
                RobotRequest::LoadItems { items, respond_to } => {
                    let count = items.len();
                    self.cargo.extend(items);
                    info!(count, cargo = self.cargo.len(), "Loaded items");
                    let _ = respond_to.send(Ok(()));
                }
                RobotRequest::SelectItem { respond_to } => {
                    let result = self.select();
                    log_outcome(operation, &result);
                    let _ = respond_to.send(result);
                }
                RobotRequest::MoveItem { cubby, respond_to } => {
                    let result = self.place(cubby);
                    log_outcome(operation, &result);
                    let _ = respond_to.send(result);
                }
                RobotRequest::AuditState { respond_to } => {
                    debug!(operation, "Audit");
                    let _ = respond_to.send(Ok(self.audit()));
                }
            }
        }

        info!(
            cargo = self.cargo.len(),
            cubbies = self.cubbies.len(),
            "Robot shutdown"
        );
    }

    fn select(&mut self) -> Result<Item, RobotError> {
        if self.selected.is_some() {
            return Err(RobotError::ItemAlreadySelected);
        }
        let item = self.cargo.pop_front().ok_or(RobotError::NoItemsAvailable)?;
        debug!(code = %item.code, remaining = self.cargo.len(), "Selected");
        self.selected = Some(item.clone());
        Ok(item)
    }

    fn place(&mut self, cubby: Cubby) -> Result<(), RobotError> {
        let item = self.selected.take().ok_or(RobotError::NoItemSelected)?;
        debug!(code = %item.code, %cubby, remaining = self.cargo.len(), "Moved");
        self.cubbies.entry(cubby.id).or_default().push(item);
        Ok(())
    }

    fn audit(&self) -> AuditReport {
        AuditReport {
            remaining: self.cargo.iter().cloned().collect(),
            selected: self.selected.clone(),
            cubbies: self.cubbies.clone(),
        }
    }
}

fn log_outcome<T>(operation: &'static str, result: &Result<T, RobotError>) {
    match result {
        Ok(_) => debug!(operation, "Request ok"),
        Err(e) => warn!(operation, error = %e, "Request rejected"),
    }
}
