/// Types for timetable inputs, generated grids and conflict reports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::GridConfig;

use super::error::TimetableError;
use super::slots::parse_cell;

/// A course as entered on the generator form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub course_code: String,
    pub subject: String,
    pub faculty: String,
    pub faculty_id: String,
    /// Slots required per week
    pub slots: u32,
    #[serde(default)]
    pub consecutive: bool,
    /// Size of each consecutive block, only meaningful when `consecutive` is set
    #[serde(default = "default_consecutive_slots")]
    pub consecutive_slots: u32,
}

fn default_consecutive_slots() -> u32 {
    1
}

impl Course {
    /// Number of adjacent slots each placement of this course takes
    pub fn block_size(&self) -> u32 {
        if self.consecutive {
            self.consecutive_slots.max(1)
        } else {
            1
        }
    }

    /// Returns true if every field the generator needs is filled in
    pub fn is_complete(&self) -> bool {
        !self.course_code.trim().is_empty()
            && !self.subject.trim().is_empty()
            && !self.faculty.trim().is_empty()
            && !self.faculty_id.trim().is_empty()
            && self.slots > 0
    }

    /// Forces the block size to 1 when the course isn't consecutive and clamps it
    /// to `1..=max_consecutive` otherwise
    pub fn normalized(mut self, max_consecutive: u32) -> Self {
        self.consecutive_slots = if self.consecutive {
            self.consecutive_slots.clamp(1, max_consecutive.max(1))
        } else {
            1
        };
        self
    }

    /// The cell content written for every slot this course occupies
    pub fn slot_entry(&self) -> SlotEntry {
        SlotEntry {
            course_code: self.course_code.clone(),
            subject: self.subject.clone(),
            faculty_name: self.faculty.clone(),
            faculty_id: self.faculty_id.clone(),
        }
    }
}

/// Department/semester metadata plus the course list for one timetable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TimetableInputs {
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub semester: String,
    #[serde(default)]
    pub block: String,
    #[serde(default)]
    pub classroom: String,
    #[serde(default)]
    pub courses: Vec<Course>,
}

/// What occupies a single non-empty cell of the grid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotEntry {
    #[serde(default)]
    pub course_code: String,
    pub subject: String,
    pub faculty_name: String,
    pub faculty_id: String,
}

/// All slot positions of one day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayColumn {
    pub day: String,
    pub slots: Vec<Option<SlotEntry>>,
}

/// Day by slot grid for one timetable.
///
/// Days keep the order of the grid configuration. The cell at `break_index`
/// of every day is never filled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyGrid {
    pub break_index: usize,
    pub days: Vec<DayColumn>,
}

impl WeeklyGrid {
    /// Creates an empty grid shaped by `config`
    pub fn new(config: &GridConfig) -> Self {
        Self {
            break_index: config.break_index,
            days: config
                .days
                .iter()
                .map(|day| DayColumn {
                    day: day.clone(),
                    slots: vec![None; config.slots_per_day()],
                })
                .collect(),
        }
    }

    /// Builds a grid from display-rendered cells, as older clients submit them.
    ///
    /// Days not in `config` and cells that don't match the rendered template are
    /// skipped, as is anything rendered into the break position.
    pub fn from_rendered(rendered: &HashMap<String, Vec<String>>, config: &GridConfig) -> Self {
        let mut grid = Self::new(config);

        for column in grid.days.iter_mut() {
            let Some(cells) = rendered.get(&column.day) else {
                continue;
            };

            for (index, cell) in cells.iter().enumerate() {
                if index >= column.slots.len() || index == grid.break_index {
                    continue;
                }
                if cell.trim().is_empty() {
                    continue;
                }
                match parse_cell(cell) {
                    Some(entry) => column.slots[index] = Some(entry),
                    None => tracing::debug!(
                        "Skipping unrecognised cell on {} slot {}",
                        column.day,
                        index + 1
                    ),
                }
            }
        }

        grid
    }

    /// Checks a submitted grid has exactly the configured days and slots, and
    /// nothing in the break position
    pub fn check_shape(&self, config: &GridConfig) -> Result<(), TimetableError> {
        if self.break_index != config.break_index {
            return Err(TimetableError::InvalidGrid {
                message: format!(
                    "break index {} does not match the configured {}",
                    self.break_index, config.break_index
                ),
            });
        }

        for column in &self.days {
            if !config.has_day(&column.day) {
                return Err(TimetableError::UnknownDay {
                    day: column.day.clone(),
                });
            }
            if column.slots.len() != config.slots_per_day() {
                return Err(TimetableError::InvalidGrid {
                    message: format!(
                        "{} has {} slots, expected {}",
                        column.day,
                        column.slots.len(),
                        config.slots_per_day()
                    ),
                });
            }
            if column.slots[config.break_index].is_some() {
                return Err(TimetableError::InvalidGrid {
                    message: format!("{} has a course in the break slot", column.day),
                });
            }
        }

        Ok(())
    }

    /// Number of slot positions per day
    pub fn slots_per_day(&self) -> usize {
        self.days.first().map(|d| d.slots.len()).unwrap_or(0)
    }

    /// Gets the cells of a day by name
    pub fn day(&self, day: &str) -> Option<&[Option<SlotEntry>]> {
        self.days
            .iter()
            .find(|c| c.day == day)
            .map(|c| c.slots.as_slice())
    }

    /// Gets a single cell
    pub fn cell(&self, day: &str, index: usize) -> Option<&SlotEntry> {
        self.day(day)
            .and_then(|slots| slots.get(index))
            .and_then(|cell| cell.as_ref())
    }

    /// Iterates every filled cell as `(day, slot index, entry)`
    pub fn filled_cells(&self) -> impl Iterator<Item = (&str, usize, &SlotEntry)> + '_ {
        self.days.iter().flat_map(|column| {
            column
                .slots
                .iter()
                .enumerate()
                .filter_map(move |(index, cell)| {
                    cell.as_ref().map(|entry| (column.day.as_str(), index, entry))
                })
        })
    }

    /// Returns true if no cell is filled
    pub fn is_empty(&self) -> bool {
        self.filled_cells().next().is_none()
    }
}

/// An existing booking of a faculty member in another saved timetable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FacultyConflict {
    /// Display label, e.g. `CSE - Semester 3 (AB1)`
    pub timetable: String,
    pub department: String,
    pub semester: String,
    pub day: String,
    /// 1-based slot number
    pub slot: u32,
}

/// Outcome of a generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub timetable: WeeklyGrid,
    /// Courses that couldn't be fully placed
    pub unplaced: Vec<String>,
    /// Conflict checks that failed and were treated as free
    pub check_warnings: Vec<String>,
}

impl GenerationResult {
    /// Returns true if every course was placed and every check succeeded
    pub fn is_clean(&self) -> bool {
        self.unplaced.is_empty() && self.check_warnings.is_empty()
    }
}

/// A generated timetable together with the inputs that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedTimetable {
    pub inputs: TimetableInputs,
    pub timetable: WeeklyGrid,
    pub generated_at: DateTime<Utc>,
}
