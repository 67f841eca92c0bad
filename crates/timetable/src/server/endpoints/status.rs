use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::timetable::grid_layout;
use crate::types::AppState;

/// GET /health
pub async fn get_health() -> Response {
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}

/// GET /config/grid
/// Returns the configured days, slot timings and break position
pub async fn get_grid_config(State(s): State<Arc<AppState>>) -> Response {
    (StatusCode::OK, Json(grid_layout(&s.config.grid))).into_response()
}
