use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::server::types::ApiErrorType;
use crate::types::AppState;

/// GET /faculty/:faculty_id/availability
/// Returns every saved booking of a faculty member across all timetables
pub async fn get_availability(
    Path(faculty_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /faculty/{}/availability", faculty_id);

    let faculty = match s.timetable_db.get_faculty(&faculty_id) {
        Ok(faculty) => faculty,
        Err(e) => {
            error!("Failed to fetch faculty {}: {}", faculty_id, e);
            return ApiErrorType::from(e).into_response();
        }
    };

    match s.timetable_db.get_faculty_availability(&faculty_id) {
        Ok(bookings) => (
            StatusCode::OK,
            Json(json!({
                "faculty_id": faculty_id,
                "faculty_name": faculty.map(|f| f.faculty_name),
                "bookings": bookings,
            })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to fetch availability for {}: {}", faculty_id, e);
            ApiErrorType::from(e).into_response()
        }
    }
}
