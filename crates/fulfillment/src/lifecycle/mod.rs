//! # System Lifecycle
//!
//! Wiring and teardown of the fulfillment pipeline.
//!
//! [`FulfillmentSystem::start`] performs, in order:
//!
//! 1. **Validate** the [`FulfillmentConfig`](crate::FulfillmentConfig).
//! 2. **Connect** to the robot with [`connect_with_backoff`]. Running out of attempts is fatal.
//! 3. **Build** the shared [`OrderStore`](crate::store::OrderStore) and the intake queue.
//! 4. **Spawn** the orchestrator loop, which takes exclusive ownership of the robot.
//!
//! [`FulfillmentSystem::shutdown`] flips the cancellation signal, waits for the loop to leave at
//! its next item boundary and reports a panicked task as
//! [`FulfillmentError::TaskFailed`](crate::FulfillmentError::TaskFailed).
//!
//! [`setup_tracing`] installs the log subscriber used by the binary.

pub mod connect;
pub mod system;
pub mod tracing;

pub use self::connect::connect_with_backoff;
pub use self::system::FulfillmentSystem;
pub use self::tracing::setup_tracing;
