use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::server::types::ApiErrorType;
use crate::server::util::{session_key, SESSION_HEADER};
use crate::timetable::SessionState;
use crate::types::AppState;

fn missing_session() -> Response {
    ApiErrorType::from((
        StatusCode::BAD_REQUEST,
        "Missing session token",
        Some(format!("Send the {} header", SESSION_HEADER)),
    ))
    .into_response()
}

/// GET /session
/// Returns the cached form inputs and last generated timetable
pub async fn get_session(State(s): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(key) = session_key(&headers) else {
        return missing_session();
    };
    info!("GET /session ({})", key);

    let state = s.sessions.get(&key).unwrap_or_else(SessionState::default);
    (StatusCode::OK, Json(state)).into_response()
}

/// DELETE /session
/// Clears the cached state of a session
pub async fn delete_session(State(s): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(key) = session_key(&headers) else {
        return missing_session();
    };
    info!("DELETE /session ({})", key);

    s.sessions.invalidate(&key);
    (StatusCode::OK, Json(json!({ "message": "Session cleared" }))).into_response()
}
