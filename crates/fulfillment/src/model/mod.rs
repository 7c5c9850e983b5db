pub mod ack;
pub mod order;
pub mod status;

pub use ack::SubmitAck;
pub use order::{Order, OrderId};
pub use status::{FulfillmentStatus, ItemStatus, OrderData, OrderStatus};
