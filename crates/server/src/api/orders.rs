//! Order seeding endpoints.
//!
//! Full order management lives elsewhere; these exist so the work queue can be
//! driven end to end.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use printqueue_core::{OrderBook, OrderError, OrderRecord, OrderStatus};
use serde::Deserialize;
use std::sync::Arc;

use super::error::{from_order_error, run_blocking, ApiError};
use crate::state::AppState;

/// Request body for creating an order
#[derive(Debug, Default, Deserialize)]
pub struct CreateOrderBody {
    /// Initial status, `new` when omitted
    pub status: Option<OrderStatus>,
}

/// Create an order
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateOrderBody>>,
) -> Result<(StatusCode, Json<OrderRecord>), ApiError> {
    let status = body.and_then(|Json(b)| b.status);
    let store = Arc::clone(state.store());
    let order = run_blocking(move || store.create_order(status).map_err(from_order_error)).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Get an order by ID
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderRecord>, ApiError> {
    let order_id = OrderError::parse_id(&id).map_err(from_order_error)?;
    let store = Arc::clone(state.store());
    let order = run_blocking(move || store.get_order(order_id).map_err(from_order_error)).await?;

    order
        .map(Json)
        .ok_or_else(|| from_order_error(OrderError::NotFound(order_id)))
}
