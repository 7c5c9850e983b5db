//! # Robot Messages
//!
//! The request protocol spoken between a [`RobotClient`](crate::RobotClient) and whatever
//! serves it (the [`RobotActor`](crate::RobotActor) simulator, or a
//! [`MockRobot`](crate::mock::MockRobot) in tests).

use crate::error::RobotError;
use crate::model::{AuditReport, Cubby, Item};
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel carried by every request.
pub type Response<T> = oneshot::Sender<Result<T, RobotError>>;

/// A single operation requested from the robot.
///
/// Each variant carries its own `respond_to` channel, so the server answers exactly the
/// caller that asked and the client can `await` the reply without any shared state.
#[derive(Debug)]
pub enum RobotRequest {
    LoadItems {
        items: Vec<Item>,
        respond_to: Response<()>,
    },
    SelectItem {
        respond_to: Response<Item>,
    },
    MoveItem {
        cubby: Cubby,
        respond_to: Response<()>,
    },
    AuditState {
        respond_to: Response<AuditReport>,
    },
}

impl RobotRequest {
    /// Short operation name, used in logs and mock diagnostics.
    pub fn operation(&self) -> &'static str {
        match self {
            RobotRequest::LoadItems { .. } => "load_items",
            RobotRequest::SelectItem { .. } => "select_item",
            RobotRequest::MoveItem { .. } => "move_item",
            RobotRequest::AuditState { .. } => "audit_state",
        }
    }
}
