//! # Robot Errors
//!
//! One error type for the whole robot boundary: the conditions the robot itself signals,
//! plus the channel failures of talking to it.

/// Errors returned by any [`SortingRobot`](crate::SortingRobot) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RobotError {
    #[error("no items in the cargo")]
    NoItemsAvailable,
    #[error("item has already been selected")]
    ItemAlreadySelected,
    #[error("item is not selected")]
    NoItemSelected,
    #[error("Robot actor closed")]
    ActorClosed,
    #[error("Robot actor dropped response channel")]
    ActorDropped,
    #[error("Robot transport error: {0}")]
    Transport(String),
}

impl RobotError {
    /// True for failures of the channel rather than of the robot's own state machine.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RobotError::ActorClosed | RobotError::ActorDropped | RobotError::Transport(_)
        )
    }
}
