use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, orders, printers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Printers
        .route(
            "/printers",
            get(printers::list_printers).post(printers::create_printer),
        )
        .route("/printers/auto-assign", post(printers::auto_assign))
        .route("/printers/complete", post(printers::complete_assignment))
        .route(
            "/printers/{id}",
            get(printers::get_printer)
                .put(printers::update_printer)
                .delete(printers::delete_printer),
        )
        .route("/printers/{id}/status", patch(printers::update_printer_status))
        // Orders
        .route("/orders", post(orders::create_order))
        .route("/orders/{id}", get(orders::get_order))
        .with_state(Arc::clone(&state));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
