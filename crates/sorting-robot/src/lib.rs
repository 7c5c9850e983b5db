//! # Sorting Robot
//!
//! The boundary to the physical item sorter. The fulfillment pipeline consumes the robot only
//! through the [`SortingRobot`] trait: pick an arbitrary available item, then move the held
//! item into a cubby.
//!
//! ## Architecture Overview
//!
//! The crate follows the actor pattern used across this workspace:
//!
//! 1. **Protocol** ([`RobotRequest`]) - one enum variant per operation, each carrying a
//!    oneshot `respond_to` channel.
//! 2. **Server** ([`RobotActor`]) - owns the robot state and answers requests sequentially.
//!    It simulates the sorter in-process for development and tests.
//! 3. **Interface** ([`RobotClient`]) - cloneable handle implementing [`SortingRobot`] on top
//!    of the channel.
//!
//! Because the client only holds a sender, anything that serves `RobotRequest`s can sit
//! behind it: the simulator, a [`mock::MockRobot`], or a transport adapter.
//!
//! ## Quick Start
//!
//! ```rust
//! use sorting_robot::{Cubby, Item, RobotActor, SortingRobot};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, robot) = RobotActor::new(16);
//!     let handle = tokio::spawn(actor.run());
//!
//!     robot.load_items(vec![Item::new("x", "Widget")]).await.unwrap();
//!     let item = robot.select_item().await.unwrap();
//!     robot.move_item(Cubby::new("1")).await.unwrap();
//!     assert_eq!(item.code, "x");
//!
//!     // Dropping the last client stops the actor
//!     drop(robot);
//!     handle.await.unwrap();
//! }
//! ```
//!
//! ## Errors
//!
//! Every operation returns [`RobotError`]. The robot's own rule violations
//! (`NoItemsAvailable`, `ItemAlreadySelected`, `NoItemSelected`) are distinguished from
//! channel failures via [`RobotError::is_transport`].

pub mod actor;
pub mod client;
pub mod error;
pub mod message;
pub mod mock;
pub mod model;
pub mod robot;

// Re-export core types for convenience
pub use actor::RobotActor;
pub use client::RobotClient;
pub use error::RobotError;
pub use message::{RobotRequest, Response};
pub use model::{AuditReport, Cubby, Item};
pub use robot::SortingRobot;
