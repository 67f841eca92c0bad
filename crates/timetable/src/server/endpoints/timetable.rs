//! API endpoints for generating, checking and saving timetables.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::server::types::{ApiErrorType, GridPayload};
use crate::server::util::session_key;
use crate::timetable::{
    self, check_faculty_load, render_grid, validate_grid, validate_inputs, ConflictOracle, Course,
    TimetableError, TimetableInputs,
};
use crate::types::AppState;

/// Body of POST /generate
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub inputs: TimetableInputs,
    /// Proceed even if some faculty exceed the weekly slot limit
    #[serde(default)]
    pub confirm_overload: bool,
    /// Fixes the random day choice
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Body of POST /timetables
#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub inputs: TimetableInputs,
    /// Falls back to the session's last generated timetable when absent
    #[serde(default)]
    pub timetable: Option<GridPayload>,
}

/// Body of POST /faculty_load
#[derive(Debug, Deserialize)]
pub struct FacultyLoadRequest {
    pub courses: Vec<Course>,
}

/// Query of GET /conflicts
#[derive(Debug, Deserialize)]
pub struct ConflictQuery {
    pub day: String,
    /// 0-based slot index
    pub slot: usize,
    pub faculty_id: String,
}

/// Logs a failed request: user errors at warn level, everything else at error
fn log_rejection(action: &str, e: &TimetableError) {
    if e.is_validation() || e.is_conflict() {
        warn!("Could not {}: {}", action, e);
    } else {
        error!("Could not {}: {}", action, e);
    }
}

/// POST /generate
///
/// Validates the form, then places every course into a fresh grid. Conflict
/// lookups that fail are reported in `check_warnings` and don't stop
/// placement.
pub async fn post_generate(
    State(s): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<GenerateRequest>,
) -> Response {
    info!(
        "POST /generate ({} - {}, {} courses)",
        req.inputs.department,
        req.inputs.semester,
        req.inputs.courses.len()
    );

    let mut rng = match req.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let report = match timetable::generate_timetable(
        &req.inputs,
        &s.config.grid,
        &s.timetable_db,
        &mut rng,
        req.confirm_overload,
    ) {
        Ok(report) => report,
        Err(e) => {
            log_rejection("generate timetable", &e);
            return ApiErrorType::from(e).into_response();
        }
    };

    if !report.unplaced.is_empty() {
        warn!(
            "Some courses could not be fully scheduled: {}",
            report.unplaced.join("; ")
        );
    }

    if let Some(key) = session_key(&headers) {
        s.sessions.record_generated(key, report.generated.clone());
    }

    let rendered = render_grid(&report.generated.timetable);
    (
        StatusCode::OK,
        Json(json!({
            "inputs": report.generated.inputs,
            "timetable": report.generated.timetable,
            "rendered": rendered,
            "generated_at": report.generated.generated_at,
            "unplaced": report.unplaced,
            "check_warnings": report.check_warnings,
            "faculty_load": report
                .faculty_load
                .iter()
                .map(|w| w.to_string())
                .collect::<Vec<_>>(),
        })),
    )
        .into_response()
}

/// POST /faculty_load
///
/// Returns the faculty whose requested weekly slots exceed the limit.
pub async fn post_faculty_load(
    State(s): State<Arc<AppState>>,
    Json(req): Json<FacultyLoadRequest>,
) -> Response {
    info!("POST /faculty_load ({} courses)", req.courses.len());

    let warnings = check_faculty_load(&req.courses, s.config.grid.faculty_load_limit);
    let messages: Vec<_> = warnings.iter().map(|w| w.to_string()).collect();
    (
        StatusCode::OK,
        Json(json!({
            "limit": s.config.grid.faculty_load_limit,
            "overloaded": warnings,
            "messages": messages,
        })),
    )
        .into_response()
}

/// GET /conflicts?day=&slot=&faculty_id=
///
/// Returns saved bookings of a faculty member at one day and slot.
pub async fn get_conflicts(
    State(s): State<Arc<AppState>>,
    Query(q): Query<ConflictQuery>,
) -> Response {
    info!(
        "GET /conflicts ({} on {} slot {})",
        q.faculty_id,
        q.day,
        q.slot + 1
    );

    if !s.config.grid.has_day(&q.day) {
        return ApiErrorType::from(TimetableError::UnknownDay { day: q.day }).into_response();
    }

    match s.timetable_db.check_conflicts(&q.day, q.slot, &q.faculty_id) {
        Ok(conflicts) => (StatusCode::OK, Json(conflicts)).into_response(),
        Err(e) => {
            error!("Failed to check faculty conflicts: {}", e);
            ApiErrorType::from(e).into_response()
        }
    }
}

/// POST /validate
///
/// Checks a finished grid against every saved timetable.
pub async fn post_validate(
    State(s): State<Arc<AppState>>,
    Json(payload): Json<GridPayload>,
) -> Response {
    info!("POST /validate");

    let grid = match payload.into_grid(&s.config.grid) {
        Ok(grid) => grid,
        Err(e) => return ApiErrorType::from(e).into_response(),
    };

    match validate_grid(&s.timetable_db, &grid) {
        Ok(validation) => (StatusCode::OK, Json(validation)).into_response(),
        Err(e) => {
            error!("Failed to validate timetable: {}", e);
            ApiErrorType::from(e).into_response()
        }
    }
}

/// POST /timetables
///
/// Saves a timetable after checking it against every saved timetable.
pub async fn post_save_timetable(
    State(s): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SaveRequest>,
) -> Response {
    info!(
        "POST /timetables ({} - {})",
        req.inputs.department, req.inputs.semester
    );

    let inputs = match validate_inputs(&req.inputs, &s.config.grid) {
        Ok(inputs) => inputs,
        Err(e) => return ApiErrorType::from(e).into_response(),
    };

    let session = session_key(&headers);
    let grid = match req.timetable {
        Some(payload) => match payload.into_grid(&s.config.grid) {
            Ok(grid) => grid,
            Err(e) => return ApiErrorType::from(e).into_response(),
        },
        None => {
            let last = session
                .as_ref()
                .and_then(|key| s.sessions.get(key))
                .and_then(|state| state.last_generated);
            match last {
                Some(generated) => generated.timetable,
                None => {
                    return ApiErrorType::from((
                        StatusCode::BAD_REQUEST,
                        "No timetable to save",
                        Some("Generate a timetable first or include one in the request".to_string()),
                    ))
                    .into_response()
                }
            }
        }
    };

    match s.timetable_db.save_timetable(&inputs, &grid) {
        Ok(id) => {
            if let Some(key) = session {
                s.sessions.record_inputs(key, inputs);
            }
            (StatusCode::CREATED, Json(json!({ "id": id }))).into_response()
        }
        Err(e) => {
            log_rejection("save timetable", &e);
            ApiErrorType::from(e).into_response()
        }
    }
}

/// GET /timetables
/// Returns every saved timetable, newest first
pub async fn get_timetables(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /timetables");

    match s.timetable_db.get_all_timetables() {
        Ok(timetables) => (StatusCode::OK, Json(timetables)).into_response(),
        Err(e) => {
            error!("Error fetching timetables: {}", e);
            ApiErrorType::from(e).into_response()
        }
    }
}

/// GET /timetables/:id
/// Returns a saved timetable with its slot rows and rebuilt grid
pub async fn get_timetable(Path(id): Path<i64>, State(s): State<Arc<AppState>>) -> Response {
    info!("GET /timetables/{}", id);

    match s.timetable_db.get_timetable_by_id(id) {
        Ok(saved) => {
            let grid = saved.to_grid(&s.config.grid);
            let rendered = render_grid(&grid);
            (
                StatusCode::OK,
                Json(json!({
                    "timetable": saved.timetable,
                    "slots": saved.slots,
                    "grid": grid,
                    "rendered": rendered,
                })),
            )
                .into_response()
        }
        Err(e) => {
            if !matches!(e, TimetableError::NotFound { .. }) {
                error!("Error fetching timetable {}: {}", id, e);
            }
            ApiErrorType::from(e).into_response()
        }
    }
}

/// DELETE /timetables/:id
pub async fn delete_timetable(Path(id): Path<i64>, State(s): State<Arc<AppState>>) -> Response {
    info!("DELETE /timetables/{}", id);

    match s.timetable_db.delete_timetable(id) {
        Ok(true) => (StatusCode::OK, Json(json!({ "message": "Timetable deleted" }))).into_response(),
        Ok(false) => ApiErrorType::from(TimetableError::NotFound { id }).into_response(),
        Err(e) => {
            error!("Error deleting timetable {}: {}", id, e);
            ApiErrorType::from(e).into_response()
        }
    }
}
