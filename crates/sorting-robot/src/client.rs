//! # Robot Client
//!
//! The cloneable handle used to drive a robot over an mpsc channel.

use crate::error::RobotError;
use crate::message::{Response, RobotRequest};
use crate::model::{AuditReport, Cubby, Item};
use crate::robot::SortingRobot;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// Type-safe client for a robot served over a [`RobotRequest`] channel.
///
/// Holds only the sender half, so cloning is cheap. Every call sends one request and awaits
/// its oneshot reply; a closed channel maps to [`RobotError::ActorClosed`] and a dropped
/// reply to [`RobotError::ActorDropped`].
#[derive(Clone, Debug)]
pub struct RobotClient {
    sender: mpsc::Sender<RobotRequest>,
}

impl RobotClient {
    pub fn new(sender: mpsc::Sender<RobotRequest>) -> Self {
        Self { sender }
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(Response<T>) -> RobotRequest,
    ) -> Result<T, RobotError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| RobotError::ActorClosed)?;
        response.await.map_err(|_| RobotError::ActorDropped)?
    }
}

#[async_trait]
impl SortingRobot for RobotClient {
    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn load_items(&self, items: Vec<Item>) -> Result<(), RobotError> {
        debug!("Sending request");
        self.call(|respond_to| RobotRequest::LoadItems { items, respond_to })
            .await
    }

    #[instrument(skip(self))]
    async fn select_item(&self) -> Result<Item, RobotError> {
        debug!("Sending request");
        self.call(|respond_to| RobotRequest::SelectItem { respond_to })
            .await
    }

    #[instrument(skip(self))]
    async fn move_item(&self, cubby: Cubby) -> Result<(), RobotError> {
        debug!("Sending request");
        self.call(|respond_to| RobotRequest::MoveItem { cubby, respond_to })
            .await
    }

    #[instrument(skip(self))]
    async fn audit_state(&self) -> Result<AuditReport, RobotError> {
        debug!("Sending request");
        self.call(|respond_to| RobotRequest::AuditState { respond_to })
            .await
    }
}
