//! Printer API handlers: registry CRUD plus the assignment operations.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use printqueue_core::{
    AutoAssignRequest, AutoAssignResult, CompleteAssignmentRequest, CreatePrinterRequest, Printer,
    PrinterError, PrinterFilter, PrinterRegistry, PrinterStatus, PrinterWithQueue,
    UpdatePrinterRequest,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{
    error_response, from_assignment_error, from_printer_error, run_blocking, ApiError,
};
use crate::state::AppState;

/// Maximum allowed limit for printer queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for printer queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing printers
#[derive(Debug, Deserialize)]
pub struct ListPrintersParams {
    /// Filter by status
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Response for listing printers
#[derive(Debug, Serialize)]
pub struct ListPrintersResponse {
    pub printers: Vec<PrinterWithQueue>,
    pub limit: i64,
    pub offset: i64,
}

/// Request body for a status change
#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// List printers with their queues, newest first
pub async fn list_printers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListPrintersParams>,
) -> Result<Json<ListPrintersResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = PrinterFilter::new().with_limit(limit).with_offset(offset);
    if let Some(raw) = params.status.as_deref().filter(|s| !s.trim().is_empty()) {
        let status = PrinterStatus::normalize(raw).ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid printer status: {}", raw),
            )
        })?;
        filter = filter.with_status(status);
    }

    let store = Arc::clone(state.store());
    let printers = run_blocking(move || {
        store.list_printers(&filter).map_err(from_printer_error)
    })
    .await?;

    Ok(Json(ListPrintersResponse {
        printers,
        limit,
        offset,
    }))
}

/// Register a printer
pub async fn create_printer(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreatePrinterRequest>,
) -> Result<(StatusCode, Json<Printer>), ApiError> {
    let store = Arc::clone(state.store());
    let printer =
        run_blocking(move || store.create_printer(body).map_err(from_printer_error)).await?;
    Ok((StatusCode::CREATED, Json(printer)))
}

/// Get a printer by ID
pub async fn get_printer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Printer>, ApiError> {
    let printer_id = PrinterError::parse_id(&id).map_err(from_printer_error)?;
    let store = Arc::clone(state.store());
    let printer = run_blocking(move || store.get_printer(printer_id).map_err(from_printer_error))
        .await?;

    printer
        .map(Json)
        .ok_or_else(|| from_printer_error(PrinterError::NotFound(printer_id)))
}

/// Partially update a printer
pub async fn update_printer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdatePrinterRequest>,
) -> Result<Json<Printer>, ApiError> {
    let printer_id = PrinterError::parse_id(&id).map_err(from_printer_error)?;
    let store = Arc::clone(state.store());
    let printer = run_blocking(move || {
        store
            .update_printer(printer_id, body)
            .map_err(from_printer_error)
    })
    .await?;
    Ok(Json(printer))
}

/// Change a printer's status
pub async fn update_printer_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<Printer>, ApiError> {
    let printer_id = PrinterError::parse_id(&id).map_err(from_printer_error)?;
    let store = Arc::clone(state.store());
    let printer = run_blocking(move || {
        store
            .update_printer_status(printer_id, &body.status)
            .map_err(from_printer_error)
    })
    .await?;
    Ok(Json(printer))
}

/// Delete an idle printer
pub async fn delete_printer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let printer_id = PrinterError::parse_id(&id).map_err(from_printer_error)?;
    let store = Arc::clone(state.store());
    run_blocking(move || store.delete_printer(printer_id).map_err(from_printer_error)).await?;
    Ok(Json(MessageResponse {
        message: "printer deleted successfully".to_string(),
    }))
}

/// Bind an order to a printer
pub async fn auto_assign(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AutoAssignRequest>,
) -> Result<Json<AutoAssignResult>, ApiError> {
    let engine = state.engine().clone();
    let result =
        run_blocking(move || engine.auto_assign(&body).map_err(from_assignment_error)).await?;
    Ok(Json(result))
}

/// Release the printer held by an order
pub async fn complete_assignment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CompleteAssignmentRequest>,
) -> Result<Json<Printer>, ApiError> {
    let engine = state.engine().clone();
    let printer = run_blocking(move || {
        engine
            .complete_assignment(&body.order_id)
            .map_err(from_assignment_error)
    })
    .await?;
    Ok(Json(printer))
}
