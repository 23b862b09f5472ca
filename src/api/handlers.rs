//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, RollupQuery, SummaryResponse};
use crate::estimate::displacement::DisplacementRow;
use crate::estimate::rollup::RollupRow;
use crate::estimate::savings::SavingsYear;

/// `GET /summary` → 200 + `SummaryResponse` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    Json(SummaryResponse::from(&state.report))
}

/// Returns rollup rows, optionally filtered by year.
///
/// `GET /rollup` → 200 + `Vec<RollupRow>` JSON
/// `GET /rollup?from=2020&to=2022` → inclusive range
/// `GET /rollup?from=2023&to=2020` → 400 + `ErrorResponse`
pub async fn get_rollup(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RollupQuery>,
) -> impl IntoResponse {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("`from` ({from}) must be <= `to` ({to})"),
                }),
            ));
        }
    }
    let rows: Vec<RollupRow> = state.report.rollup_between(query.from, query.to).to_vec();
    Ok(Json(rows))
}

/// `GET /savings` → 200 + `Vec<SavingsYear>` JSON
pub async fn get_savings(State(state): State<Arc<AppState>>) -> Json<Vec<SavingsYear>> {
    Json(state.report.savings.clone())
}

/// `GET /displacement` → 200 + `Vec<DisplacementRow>` JSON
pub async fn get_displacement(State(state): State<Arc<AppState>>) -> Json<Vec<DisplacementRow>> {
    Json(state.report.displacement.clone())
}
