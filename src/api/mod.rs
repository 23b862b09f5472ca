//! REST API over a finished inventory report.
//!
//! GET endpoints:
//! - `/summary`: municipality, latest year and savings summary
//! - `/rollup`: sector rollup with optional `from`/`to` year range
//! - `/savings`: yearly savings attribution
//! - `/displacement`: heat-pump propane displacement table

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::pipeline::InventoryReport;

pub use types::{ErrorResponse, RollupQuery, SummaryResponse};

/// Read-only state shared by every handler.
pub struct AppState {
    pub report: InventoryReport,
}

/// Builds the router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/summary", get(handlers::get_summary))
        .route("/rollup", get(handlers::get_rollup))
        .route("/savings", get(handlers::get_savings))
        .route("/displacement", get(handlers::get_displacement))
        .with_state(state)
}

/// Binds to `addr` and serves the API until the process ends.
///
/// # Panics
///
/// Panics if the TCP listener cannot bind to `addr`.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {addr}: {e}"));
    info!(%addr, "API server listening");
    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| panic!("server error: {e}"));
}
