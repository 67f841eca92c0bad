use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::GridConfig;
use crate::timetable::{TimetableError, WeeklyGrid};

/// JSON error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiErrorType {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl From<(StatusCode, &str, Option<String>)> for ApiErrorType {
    fn from((status, error, context): (StatusCode, &str, Option<String>)) -> Self {
        Self {
            status,
            error: error.to_string(),
            context,
            details: Vec::new(),
        }
    }
}

impl From<TimetableError> for ApiErrorType {
    fn from(err: TimetableError) -> Self {
        let (status, message) = match &err {
            TimetableError::MissingField { .. } => (StatusCode::BAD_REQUEST, "Missing Information"),
            TimetableError::NoValidCourses => (StatusCode::BAD_REQUEST, "No Valid Courses"),
            TimetableError::UnknownDay { .. } | TimetableError::InvalidGrid { .. } => {
                (StatusCode::BAD_REQUEST, "Invalid timetable")
            }
            TimetableError::FacultyOverload { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Faculty slot limit exceeded; resubmit with confirm_overload to proceed",
            ),
            TimetableError::Conflicts { .. } => {
                (StatusCode::CONFLICT, "Cannot save timetable due to faculty conflicts")
            }
            TimetableError::NotFound { .. } => (StatusCode::NOT_FOUND, "Timetable not found"),
            TimetableError::ConflictCheck { .. } => (
                StatusCode::BAD_GATEWAY,
                "Unable to verify faculty availability",
            ),
            TimetableError::Database { .. } | TimetableError::InvalidConfig { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        };

        let details = match &err {
            TimetableError::Conflicts { conflicts } => conflicts.clone(),
            TimetableError::FacultyOverload { warnings } => warnings.clone(),
            _ => Vec::new(),
        };

        Self {
            status,
            error: message.to_string(),
            context: Some(err.to_string()),
            details,
        }
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// A grid as submitted by a client: either structured cells or the rendered
/// day -> cell strings map
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GridPayload {
    Structured(WeeklyGrid),
    Rendered(HashMap<String, Vec<String>>),
}

impl GridPayload {
    /// Converts the payload into a grid shaped by `config`.
    ///
    /// Structured grids must match the configured week exactly; rendered cells
    /// that can't be parsed are dropped.
    pub fn into_grid(self, config: &GridConfig) -> Result<WeeklyGrid, TimetableError> {
        match self {
            GridPayload::Structured(grid) => {
                grid.check_shape(config)?;
                Ok(grid)
            }
            GridPayload::Rendered(cells) => Ok(WeeklyGrid::from_rendered(&cells, config)),
        }
    }
}
