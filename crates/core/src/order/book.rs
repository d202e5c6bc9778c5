use thiserror::Error;
use uuid::Uuid;

use super::{OrderRecord, OrderStatus};

/// Error type for order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid order ID: {0}")]
    InvalidOrderId(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl OrderError {
    pub fn parse_id(raw: &str) -> Result<Uuid, OrderError> {
        Uuid::parse_str(raw.trim()).map_err(|_| OrderError::InvalidOrderId(raw.to_string()))
    }
}

/// Order status access from inside a work-queue transaction.
pub trait OrderStatusTx {
    /// Lock the order row and return its status, `None` if it does not exist.
    fn order_status_for_update(&mut self, order_id: Uuid)
        -> Result<Option<OrderStatus>, OrderError>;

    /// Overwrite the order status.
    fn set_order_status(&mut self, order_id: Uuid, status: OrderStatus) -> Result<(), OrderError>;
}

/// The slice of order CRUD the work queue needs outside a transaction.
pub trait OrderBook: Send + Sync {
    /// Create an order in the given status (`new` when `None`).
    fn create_order(&self, status: Option<OrderStatus>) -> Result<OrderRecord, OrderError>;

    /// Get an order by ID.
    fn get_order(&self, id: Uuid) -> Result<Option<OrderRecord>, OrderError>;
}
