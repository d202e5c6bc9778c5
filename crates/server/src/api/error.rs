//! Error responses shared by the API handlers.

use axum::{http::StatusCode, Json};
use printqueue_core::{AssignmentError, OrderError, PrinterError};
use serde::Serialize;
use tracing::error;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn internal(message: String) -> ApiError {
    error!("Internal error: {}", message);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}

pub fn from_assignment_error(e: AssignmentError) -> ApiError {
    let status = match &e {
        AssignmentError::InvalidOrderId(_)
        | AssignmentError::InvalidPrinterId(_)
        | AssignmentError::InvalidEstimatedTime(_) => StatusCode::BAD_REQUEST,
        AssignmentError::OrderNotFound
        | AssignmentError::PrinterNotFound
        | AssignmentError::AssignmentNotFound => StatusCode::NOT_FOUND,
        AssignmentError::OrderAlreadyAssigned => StatusCode::CONFLICT,
        AssignmentError::PrinterUnavailable | AssignmentError::NoCompatiblePrinter => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AssignmentError::Database(_) => return internal(e.to_string()),
    };
    error_response(status, e.to_string())
}

pub fn from_printer_error(e: PrinterError) -> ApiError {
    let status = match &e {
        PrinterError::InvalidPrinterId(_)
        | PrinterError::InvalidStatus(_)
        | PrinterError::InvalidName(_) => StatusCode::BAD_REQUEST,
        PrinterError::NotFound(_) => StatusCode::NOT_FOUND,
        PrinterError::PrinterInUse { .. } => StatusCode::CONFLICT,
        PrinterError::Database(_) => return internal(e.to_string()),
    };
    error_response(status, e.to_string())
}

pub fn from_order_error(e: OrderError) -> ApiError {
    let status = match &e {
        OrderError::InvalidOrderId(_) => StatusCode::BAD_REQUEST,
        OrderError::NotFound(_) => StatusCode::NOT_FOUND,
        OrderError::Database(_) => return internal(e.to_string()),
    };
    error_response(status, e.to_string())
}

/// Run blocking store work off the async runtime.
pub async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| internal(format!("Blocking task failed: {}", e)))?
}
