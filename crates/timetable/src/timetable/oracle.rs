//! Faculty conflict lookups against previously saved timetables.
//!
//! The same lookup is used under two policies. During generation a failed
//! lookup is logged, reported as a warning and treated as free
//! ([`FailOpenChecker`]). Before a save every failure aborts the save
//! ([`validate_grid`]).

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::TimetableError;
use super::types::{FacultyConflict, WeeklyGrid};

/// Answers whether a faculty member is already booked at a day and slot in any
/// saved timetable.
pub trait ConflictOracle {
    /// Returns every saved booking of `faculty_id` at `day` / `slot_index`
    /// (0-based). An empty list means the slot is free.
    fn check_conflicts(
        &self,
        day: &str,
        slot_index: usize,
        faculty_id: &str,
    ) -> Result<Vec<FacultyConflict>, TimetableError>;
}

impl<T: ConflictOracle + ?Sized> ConflictOracle for &T {
    fn check_conflicts(
        &self,
        day: &str,
        slot_index: usize,
        faculty_id: &str,
    ) -> Result<Vec<FacultyConflict>, TimetableError> {
        (**self).check_conflicts(day, slot_index, faculty_id)
    }
}

impl<T: ConflictOracle + ?Sized> ConflictOracle for Arc<T> {
    fn check_conflicts(
        &self,
        day: &str,
        slot_index: usize,
        faculty_id: &str,
    ) -> Result<Vec<FacultyConflict>, TimetableError> {
        (**self).check_conflicts(day, slot_index, faculty_id)
    }
}

/// An oracle with no saved timetables behind it
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSavedTimetables;

impl ConflictOracle for NoSavedTimetables {
    fn check_conflicts(
        &self,
        _day: &str,
        _slot_index: usize,
        _faculty_id: &str,
    ) -> Result<Vec<FacultyConflict>, TimetableError> {
        Ok(Vec::new())
    }
}

/// Per-slot checker used while generating.
///
/// Lookup failures count as "no conflict"; each one is kept so it can be
/// shown to the user alongside the generated grid.
pub struct FailOpenChecker<O> {
    oracle: O,
    warnings: Vec<String>,
}

impl<O: ConflictOracle> FailOpenChecker<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            warnings: Vec::new(),
        }
    }

    /// Returns true unless the oracle reports an existing booking
    pub fn is_free(&mut self, day: &str, slot_index: usize, faculty_id: &str) -> bool {
        match self.oracle.check_conflicts(day, slot_index, faculty_id) {
            Ok(conflicts) => {
                if let Some(first) = conflicts.first() {
                    debug!(
                        "{} is busy on {} slot {} ({})",
                        faculty_id,
                        day,
                        slot_index + 1,
                        first.timetable
                    );
                }
                conflicts.is_empty()
            }
            Err(e) => {
                warn!(
                    "Conflict check failed for {} on {} slot {}: {}",
                    faculty_id,
                    day,
                    slot_index + 1,
                    e
                );
                self.warnings.push(format!(
                    "Unable to verify availability of {} on {} slot {}: {}",
                    faculty_id,
                    day,
                    slot_index + 1,
                    e
                ));
                true
            }
        }
    }

    /// Warnings collected so far
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}

/// Result of checking a finished grid against saved timetables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridValidation {
    pub valid: bool,
    pub conflicts: Vec<String>,
}

/// Checks every filled cell of `grid` against saved timetables.
///
/// Any lookup failure is returned as an error; the grid must not be saved
/// unless this returns `valid == true`.
pub fn validate_grid<O: ConflictOracle>(
    oracle: &O,
    grid: &WeeklyGrid,
) -> Result<GridValidation, TimetableError> {
    let mut conflicts = Vec::new();

    for (day, slot_index, entry) in grid.filled_cells() {
        if slot_index == grid.break_index {
            continue;
        }

        let existing = oracle.check_conflicts(day, slot_index, &entry.faculty_id)?;
        if let Some(first) = existing.first() {
            conflicts.push(format!(
                "{} is already teaching on {} slot {} in {}",
                entry.faculty_id,
                day,
                slot_index + 1,
                first.timetable
            ));
        }
    }

    Ok(GridValidation {
        valid: conflicts.is_empty(),
        conflicts,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::timetable::types::SlotEntry;
    use std::cell::Cell;
    use std::collections::HashSet;

    /// In-memory bookings keyed by (day, slot index, faculty id)
    #[derive(Default)]
    pub(crate) struct FakeOracle {
        pub booked: HashSet<(String, usize, String)>,
        pub fail: bool,
        pub calls: Cell<usize>,
    }

    impl FakeOracle {
        pub(crate) fn book(&mut self, day: &str, slot_index: usize, faculty_id: &str) {
            self.booked
                .insert((day.to_string(), slot_index, faculty_id.to_string()));
        }
    }

    impl ConflictOracle for FakeOracle {
        fn check_conflicts(
            &self,
            day: &str,
            slot_index: usize,
            faculty_id: &str,
        ) -> Result<Vec<FacultyConflict>, TimetableError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(TimetableError::ConflictCheck {
                    message: "store unreachable".to_string(),
                });
            }
            let key = (day.to_string(), slot_index, faculty_id.to_string());
            if self.booked.contains(&key) {
                Ok(vec![FacultyConflict {
                    timetable: "ECE - Semester 5 (AB2)".to_string(),
                    department: "ECE".to_string(),
                    semester: "Semester 5".to_string(),
                    day: day.to_string(),
                    slot: slot_index as u32 + 1,
                }])
            } else {
                Ok(Vec::new())
            }
        }
    }

    fn entry(faculty_id: &str) -> SlotEntry {
        SlotEntry {
            course_code: "CS201".to_string(),
            subject: "Data Structures".to_string(),
            faculty_name: "Dr. Smith".to_string(),
            faculty_id: faculty_id.to_string(),
        }
    }

    #[test]
    fn test_validate_grid_without_collisions() {
        let mut oracle = FakeOracle::default();
        oracle.book("Tuesday", 2, "F001");

        let mut grid = WeeklyGrid::new(&GridConfig::default());
        grid.days[0].slots[2] = Some(entry("F001"));

        let result = validate_grid(&oracle, &grid).unwrap();
        assert!(result.valid);
        assert!(result.conflicts.is_empty());
    }

    #[test]
    fn test_validate_grid_reports_collision() {
        let mut oracle = FakeOracle::default();
        oracle.book("Tuesday", 4, "F001");

        let mut grid = WeeklyGrid::new(&GridConfig::default());
        grid.days[1].slots[4] = Some(entry("F001"));

        let result = validate_grid(&oracle, &grid).unwrap();
        assert!(!result.valid);
        assert_eq!(result.conflicts.len(), 1);
        let message = &result.conflicts[0];
        assert!(message.contains("F001"));
        assert!(message.contains("Tuesday"));
        assert!(message.contains("slot 5"));
    }

    #[test]
    fn test_validate_grid_fails_closed() {
        let oracle = FakeOracle {
            fail: true,
            ..Default::default()
        };
        let mut grid = WeeklyGrid::new(&GridConfig::default());
        grid.days[0].slots[0] = Some(entry("F001"));

        assert!(matches!(
            validate_grid(&oracle, &grid),
            Err(TimetableError::ConflictCheck { .. })
        ));
    }

    #[test]
    fn test_fail_open_checker_treats_errors_as_free() {
        let oracle = FakeOracle {
            fail: true,
            ..Default::default()
        };
        let mut checker = FailOpenChecker::new(&oracle);
        assert!(checker.is_free("Monday", 0, "F001"));
        assert_eq!(checker.warnings().len(), 1);
        assert!(checker.warnings()[0].contains("F001"));
    }

    #[test]
    fn test_fail_open_checker_respects_bookings() {
        let mut oracle = FakeOracle::default();
        oracle.book("Monday", 0, "F001");
        let mut checker = FailOpenChecker::new(&oracle);
        assert!(!checker.is_free("Monday", 0, "F001"));
        assert!(checker.is_free("Monday", 1, "F001"));
        assert!(checker.into_warnings().is_empty());
    }
}
