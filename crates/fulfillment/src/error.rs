use crate::store::StoreError;
use sorting_robot::RobotError;
use thiserror::Error;

/// Errors surfaced by the fulfillment pipeline and its service facade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FulfillmentError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Robot error: {0}")]
    Robot(#[from] RobotError),
    #[error("Robot {operation} timed out after {timeout_ms} ms")]
    RobotTimeout {
        operation: &'static str,
        timeout_ms: u64,
    },
    #[error("Intake queue closed")]
    IntakeClosed,
    #[error("Processing cancelled")]
    Cancelled,
    #[error("Robot unreachable after {attempts} attempts: {last_error}")]
    StartupFailed { attempts: u32, last_error: RobotError },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Processing task failed: {0}")]
    TaskFailed(String),
}

impl FulfillmentError {
    /// True when a store lookup found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FulfillmentError::Store(e) if e.is_not_found())
    }

    /// True for failures attributable to the robot, including timeouts.
    pub fn is_robot(&self) -> bool {
        matches!(
            self,
            FulfillmentError::Robot(_) | FulfillmentError::RobotTimeout { .. }
        )
    }
}
