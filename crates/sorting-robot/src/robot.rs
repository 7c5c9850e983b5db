//! # SortingRobot Trait
//!
//! The seam between the fulfillment pipeline and the physical sorter. The orchestrator only
//! ever talks to a `SortingRobot`, so a network client, the in-process simulator and test
//! doubles are interchangeable.
use crate::error::RobotError;
use crate::model::{AuditReport, Cubby, Item};
use async_trait::async_trait;

/// Operations exposed by a sorting robot.
///
/// The robot holds at most one selected item at a time. `select_item` picks an arbitrary
/// available item (it is not addressed to any order) and `move_item` drops the held item
/// into a cubby.
///
/// # Example
///
/// ```rust
/// use sorting_robot::{Cubby, Item, RobotActor, SortingRobot};
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, robot) = RobotActor::new(8);
///     tokio::spawn(actor.run());
///
///     robot.load_items(vec![Item::new("x", "Widget")]).await.unwrap();
///     let item = robot.select_item().await.unwrap();
///     assert_eq!(item.code, "x");
///     robot.move_item(Cubby::new("3")).await.unwrap();
///
///     let audit = robot.audit_state().await.unwrap();
///     assert_eq!(audit.placed(), 1);
/// }
/// ```
#[async_trait]
pub trait SortingRobot: Send + Sync {
    /// Adds items to the robot's cargo.
    async fn load_items(&self, items: Vec<Item>) -> Result<(), RobotError>;

    /// Picks the next available item.
    ///
    /// Fails with [`RobotError::ItemAlreadySelected`] while another item is held and with
    /// [`RobotError::NoItemsAvailable`] when the cargo is empty.
    async fn select_item(&self) -> Result<Item, RobotError>;

    /// Drops the selected item into `cubby`.
    ///
    /// Fails with [`RobotError::NoItemSelected`] when nothing is held.
    async fn move_item(&self, cubby: Cubby) -> Result<(), RobotError>;

    /// Reports cargo, held item and cubby contents.
    async fn audit_state(&self) -> Result<AuditReport, RobotError>;
}
