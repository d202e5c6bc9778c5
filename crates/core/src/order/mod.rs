//! Order status collaborator.
//!
//! Orders are owned by the wider panel; the work queue only reads an order's
//! status under lock and advances `new` to `printing` on first assignment.

mod book;
mod types;

pub use book::{OrderBook, OrderError, OrderStatusTx};
pub use types::{OrderRecord, OrderStatus};
