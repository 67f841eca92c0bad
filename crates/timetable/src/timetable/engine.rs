//! Random placement of course slots into a weekly grid.
//!
//! Placement is greedy: for every block of a course a day is picked at
//! random, the first window of free, conflict-free slots on it wins, and the
//! remaining days are tried in configured order when it has none. A course
//! that runs out of days keeps whatever it already placed and gets a warning.

use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::GridConfig;

use super::oracle::{ConflictOracle, FailOpenChecker};
use super::types::{Course, GenerationResult, SlotEntry, WeeklyGrid};

/// Places courses into a grid shaped by a [`GridConfig`]
pub struct PlacementEngine<'a> {
    config: &'a GridConfig,
}

impl<'a> PlacementEngine<'a> {
    pub fn new(config: &'a GridConfig) -> Self {
        Self { config }
    }

    /// Generates a fresh grid for `courses`, in input order.
    ///
    /// # Arguments
    /// * `courses` - Courses to place; block sizes are clamped to the config
    /// * `oracle` - Lookup for bookings in saved timetables
    /// * `rng` - Source for the day choice; seed it for repeatable output
    ///
    /// # Returns
    /// The grid, one warning per course that couldn't be fully placed, and a
    /// warning per conflict check that failed and was treated as free.
    pub fn generate<O: ConflictOracle, R: Rng>(
        &self,
        courses: &[Course],
        oracle: O,
        rng: &mut R,
    ) -> GenerationResult {
        let mut grid = WeeklyGrid::new(self.config);
        let mut checker = FailOpenChecker::new(oracle);
        let mut unplaced = Vec::new();

        for course in courses {
            let course = course.clone().normalized(self.config.max_consecutive);
            if let Err(message) = self.place_course(&mut grid, &course, &mut checker, rng) {
                unplaced.push(message);
            }
        }

        let check_warnings = checker.into_warnings();
        info!(
            "Generated timetable for {} courses ({} unplaced, {} failed checks)",
            courses.len(),
            unplaced.len(),
            check_warnings.len()
        );

        GenerationResult {
            timetable: grid,
            unplaced,
            check_warnings,
        }
    }

    /// Places every required slot of one course into `grid`.
    ///
    /// Returns the warning message when the course couldn't be fully placed.
    /// Blocks placed before that point stay in the grid.
    pub fn place_course<O: ConflictOracle, R: Rng>(
        &self,
        grid: &mut WeeklyGrid,
        course: &Course,
        checker: &mut FailOpenChecker<O>,
        rng: &mut R,
    ) -> Result<(), String> {
        let day_count = grid.days.len();
        if day_count == 0 {
            return Err(unplaced_message(course));
        }

        let block_size = course.block_size() as usize;
        let mut remaining = course.slots as usize;

        while remaining > 0 {
            let to_place = block_size.min(remaining);
            let first = rng.gen_range(0..day_count);

            let fallback = (0..day_count).filter(|&d| d != first);
            let placed = std::iter::once(first)
                .chain(fallback)
                .find_map(|day| self.place_block(grid, day, course, to_place, checker));

            match placed {
                Some((day, start)) => {
                    debug!(
                        "Placed {} ({}) on {} slots {}-{}",
                        course.subject,
                        course.faculty_id,
                        grid.days[day].day,
                        start + 1,
                        start + to_place
                    );
                    remaining -= to_place;
                }
                None => {
                    warn!(
                        "Could not place {} remaining slot(s) for {} ({})",
                        remaining, course.subject, course.faculty_id
                    );
                    return Err(unplaced_message(course));
                }
            }
        }

        Ok(())
    }

    /// Writes `count` adjacent cells for `course` on day `day` at the first
    /// window that fits. Returns `(day, start index)` on success.
    fn place_block<O: ConflictOracle>(
        &self,
        grid: &mut WeeklyGrid,
        day: usize,
        course: &Course,
        count: usize,
        checker: &mut FailOpenChecker<O>,
    ) -> Option<(usize, usize)> {
        let break_index = grid.break_index;
        let column = &mut grid.days[day];
        let len = column.slots.len();

        for start in 0..len {
            if start == break_index {
                continue;
            }

            let mut fits = true;
            for pos in start..start + count {
                if pos >= len || pos == break_index || column.slots[pos].is_some() {
                    fits = false;
                    break;
                }
                if !checker.is_free(&column.day, pos, &course.faculty_id) {
                    fits = false;
                    break;
                }
            }

            if fits {
                let entry: SlotEntry = course.slot_entry();
                for cell in &mut column.slots[start..start + count] {
                    *cell = Some(entry.clone());
                }
                return Some((day, start));
            }
        }

        None
    }
}

fn unplaced_message(course: &Course) -> String {
    format!(
        "Could not place all slots for {} ({}) due to conflicts",
        course.subject, course.faculty_id
    )
}
