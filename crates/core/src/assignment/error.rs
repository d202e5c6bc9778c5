//! Error types for the assignment module.

use thiserror::Error;

use crate::order::OrderError;

/// Typed outcomes of assignment and completion.
///
/// Every variant aborts the surrounding transaction in full. Nothing is
/// retried inside the engine.
#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("invalid order ID: {0}")]
    InvalidOrderId(String),

    #[error("invalid printer ID: {0}")]
    InvalidPrinterId(String),

    #[error("invalid estimated time: {0}")]
    InvalidEstimatedTime(String),

    #[error("order not found")]
    OrderNotFound,

    #[error("printer not found")]
    PrinterNotFound,

    #[error("active printer assignment not found")]
    AssignmentNotFound,

    #[error("order already has an active printer assignment")]
    OrderAlreadyAssigned,

    #[error("printer is unavailable")]
    PrinterUnavailable,

    #[error("no compatible printer available")]
    NoCompatiblePrinter,

    /// Lock wait timeouts, lost connections and any other store failure.
    #[error("database error: {0}")]
    Database(String),
}

impl AssignmentError {
    /// Short stable label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AssignmentError::InvalidOrderId(_) => "invalid_order_id",
            AssignmentError::InvalidPrinterId(_) => "invalid_printer_id",
            AssignmentError::InvalidEstimatedTime(_) => "invalid_estimated_time",
            AssignmentError::OrderNotFound => "order_not_found",
            AssignmentError::PrinterNotFound => "printer_not_found",
            AssignmentError::AssignmentNotFound => "assignment_not_found",
            AssignmentError::OrderAlreadyAssigned => "order_already_assigned",
            AssignmentError::PrinterUnavailable => "printer_unavailable",
            AssignmentError::NoCompatiblePrinter => "no_compatible_printer",
            AssignmentError::Database(_) => "database",
        }
    }
}

impl From<OrderError> for AssignmentError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(_) => AssignmentError::OrderNotFound,
            OrderError::InvalidOrderId(raw) => AssignmentError::InvalidOrderId(raw),
            OrderError::Database(msg) => AssignmentError::Database(msg),
        }
    }
}

impl From<rusqlite::Error> for AssignmentError {
    fn from(err: rusqlite::Error) -> Self {
        AssignmentError::Database(err.to_string())
    }
}
