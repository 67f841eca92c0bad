/// Timetable generation: inputs, placement, conflict checks and session state
mod engine;
mod error;
mod load;
mod oracle;
mod session;
mod slots;
mod types;
mod validate;

pub use engine::PlacementEngine;
pub use error::TimetableError;
pub use load::{check_faculty_load, FacultyLoadWarning};
pub use oracle::{validate_grid, ConflictOracle, FailOpenChecker, GridValidation, NoSavedTimetables};
pub use session::{SessionKey, SessionState, SessionStore};
pub use slots::{
    grid_layout, parse_cell, render_cell, render_grid, slot_timing, GridLayout, RenderedDay,
    SlotLabel, UnrecognisedCell,
};
pub use types::*;
pub use validate::validate_inputs;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GridConfig;

/// Everything a generation request produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generated: GeneratedTimetable,
    pub unplaced: Vec<String>,
    pub check_warnings: Vec<String>,
    pub faculty_load: Vec<FacultyLoadWarning>,
}

/// Validates `inputs`, checks faculty load, then generates a timetable.
///
/// The load check sums every row of the submitted course list, including rows
/// still missing fields. Faculty over the load limit block generation unless
/// `confirm_overload` is set, in which case they are only reported. Conflict lookups that fail
/// during generation are treated as free and reported in `check_warnings`.
pub fn generate_timetable<O: ConflictOracle, R: Rng>(
    inputs: &TimetableInputs,
    config: &GridConfig,
    oracle: O,
    rng: &mut R,
    confirm_overload: bool,
) -> Result<GenerationReport, TimetableError> {
    let validated = validate_inputs(inputs, config)?;

    let faculty_load = check_faculty_load(&inputs.courses, config.faculty_load_limit);
    if !faculty_load.is_empty() && !confirm_overload {
        return Err(TimetableError::FacultyOverload {
            warnings: faculty_load.iter().map(|w| w.to_string()).collect(),
        });
    }

    let result = PlacementEngine::new(config).generate(&validated.courses, oracle, rng);

    Ok(GenerationReport {
        generated: GeneratedTimetable {
            inputs: validated,
            timetable: result.timetable,
            generated_at: Utc::now(),
        },
        unplaced: result.unplaced,
        check_warnings: result.check_warnings,
        faculty_load,
    })
}
