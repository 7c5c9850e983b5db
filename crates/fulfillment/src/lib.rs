//! # Fulfillment
//!
//! Coordinates batches of customer orders with a [`SortingRobot`](sorting_robot::SortingRobot):
//! every order gets a cubby, the robot is asked for items one at a time, and each item is moved
//! into the cubby of the oldest order still waiting for its code.
//!
//! ## Components
//!
//! - **[cubby]**: deterministic hash-probe assignment of free cubbies.
//! - **[store]**: the shared [`OrderStore`](store::OrderStore) with order records, the
//!   per-code destination queues and derived statuses.
//! - **[intake]**: the FIFO between submitters and the single processing loop.
//! - **[orchestrator]**: the processing loop that drives the robot.
//! - **[service]**: the client-facing operations.
//! - **[lifecycle]**: startup (robot connection with backoff), shutdown and tracing setup.
//! - **[config]**: settings from defaults, JSON and `FULFILLMENT_*` variables.
//!
//! ## Data Flow
//!
//! ```text
//! submit_orders ──► intake ──► orchestrator ──► select_item / move_item ──► robot
//!                                   │
//!                                   ▼
//!      get_order_status ◄──── OrderStore (records, destinations, cubbies)
//! ```
//!
//! Batches are processed strictly one after another; queries and submissions never wait for
//! the robot.

pub mod config;
pub mod cubby;
pub mod error;
pub mod intake;
pub mod lifecycle;
pub mod model;
pub mod orchestrator;
pub mod service;
pub mod store;

pub use config::{ConnectRetryConfig, FulfillmentConfig};
pub use error::FulfillmentError;
pub use lifecycle::FulfillmentSystem;
pub use model::{FulfillmentStatus, ItemStatus, Order, OrderId, OrderStatus, SubmitAck};
pub use orchestrator::{BatchReport, OrderOutcome, Orchestrator};
pub use service::FulfillmentService;
