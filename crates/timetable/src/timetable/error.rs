//! Error types for timetable generation and persistence.

use thiserror::Error;

/// Errors that can occur while validating, generating or saving a timetable.
#[derive(Debug, Error, Clone)]
pub enum TimetableError {
    /// A required form field was left empty
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// None of the submitted courses were complete
    #[error("No valid courses: add at least one complete course")]
    NoValidCourses,

    /// The conflict lookup against saved timetables failed
    #[error("Conflict check failed: {message}")]
    ConflictCheck { message: String },

    /// Faculty are already booked in another saved timetable
    #[error("Cannot save timetable due to faculty conflicts:\n{}", conflicts.join("\n"))]
    Conflicts { conflicts: Vec<String> },

    /// The persistence store rejected a read or write
    #[error("Database error: {message}")]
    Database { message: String },

    /// No saved timetable with this id
    #[error("Timetable {id} not found")]
    NotFound { id: i64 },

    /// A day name that isn't part of the configured week
    #[error("Unknown day: {day}")]
    UnknownDay { day: String },

    /// A submitted grid doesn't match the configured week
    #[error("Invalid timetable grid: {message}")]
    InvalidGrid { message: String },

    /// Some faculty exceed the weekly slot limit and the user hasn't confirmed
    #[error("Faculty load exceeded:\n{}", warnings.join("\n"))]
    FacultyOverload { warnings: Vec<String> },

    /// The grid configuration can't be used
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl TimetableError {
    /// Returns true if this error came from checking user input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TimetableError::MissingField { .. }
                | TimetableError::NoValidCourses
                | TimetableError::UnknownDay { .. }
                | TimetableError::InvalidGrid { .. }
        )
    }

    /// Returns true if this error blocks a save because of faculty conflicts.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            TimetableError::Conflicts { .. } | TimetableError::FacultyOverload { .. }
        )
    }
}

impl From<rusqlite::Error> for TimetableError {
    fn from(err: rusqlite::Error) -> Self {
        TimetableError::Database {
            message: err.to_string(),
        }
    }
}
