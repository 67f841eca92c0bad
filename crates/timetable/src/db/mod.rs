/// Database module for saved timetables, their slots and faculty records

mod types;

pub use types::{DbFaculty, DbTimetable, DbTimetableSlot, DbTimetableWithSlots, FacultyBooking};

use chrono::Utc;
use rusqlite::{Connection, Row};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};

use crate::config::GridConfig;
use crate::timetable::{
    validate_grid, ConflictOracle, Course, FacultyConflict, SlotEntry, TimetableError,
    TimetableInputs, WeeklyGrid,
};

use types::timetable_label;

const SCHEMA_SQL: &str = include_str!("../../../../sql/init_timetables.sql");

const SLOT_COLUMNS: &str = "s.id, s.timetable_id, s.day, s.slot_number, s.subject,
                            s.faculty_id, s.course_code, f.faculty_name";

pub struct TimetableDbManager {
    db: Mutex<Connection>,
}

impl TimetableDbManager {
    /// Opens (or creates) the database at `db_path` and initializes the schema
    pub fn new(db_path: &str) -> Result<Self, TimetableError> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// Creates a database that lives only as long as this manager
    pub fn in_memory() -> Result<Self, TimetableError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, TimetableError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, TimetableError> {
        self.db.lock().map_err(|_| TimetableError::Database {
            message: "database lock poisoned".to_string(),
        })
    }

    /// Inserts or updates one faculty row per course, keyed by faculty id.
    ///
    /// The department column holds the course subject.
    pub fn upsert_faculty(&self, courses: &[Course]) -> Result<(), TimetableError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "INSERT INTO faculty (faculty_id, faculty_name, department)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(faculty_id) DO UPDATE SET
                faculty_name = excluded.faculty_name,
                department = excluded.department",
        )?;

        for course in courses {
            stmt.execute((&course.faculty_id, &course.faculty, &course.subject))?;
        }

        Ok(())
    }

    /// Gets a faculty record by id
    pub fn get_faculty(&self, faculty_id: &str) -> Result<Option<DbFaculty>, TimetableError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT faculty_id, faculty_name, department FROM faculty WHERE faculty_id = ?",
        )?;
        let mut rows = stmt.query_map([faculty_id], |row| {
            Ok(DbFaculty {
                faculty_id: row.get(0)?,
                faculty_name: row.get(1)?,
                department: row.get(2)?,
            })
        })?;

        Ok(rows.next().transpose()?)
    }

    /// Inserts timetable metadata and returns the generated id
    pub fn insert_timetable(&self, inputs: &TimetableInputs) -> Result<i64, TimetableError> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO timetables (department, semester, block, classroom, created_at, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
            (
                &inputs.department,
                &inputs.semester,
                &inputs.block,
                &inputs.classroom,
                Utc::now(),
            ),
        )?;

        Ok(db.last_insert_rowid())
    }

    /// Inserts one slot row per filled cell of `grid`. Returns the row count.
    pub fn insert_slots(&self, timetable_id: i64, grid: &WeeklyGrid) -> Result<usize, TimetableError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "INSERT INTO timetable_slots
                (timetable_id, day, slot_number, subject, faculty_id, course_code)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;

        let mut inserted = 0;
        for (day, slot_index, entry) in grid.filled_cells() {
            if slot_index == grid.break_index {
                continue;
            }
            let course_code = Some(entry.course_code.as_str()).filter(|c| !c.is_empty());
            stmt.execute((
                timetable_id,
                day,
                slot_index as i64,
                &entry.subject,
                &entry.faculty_id,
                course_code,
            ))?;
            inserted += 1;
        }

        Ok(inserted)
    }

    /// Saves a timetable: conflict check, faculty upsert, metadata, slots.
    ///
    /// The steps are separate writes. If the slot insert fails, the metadata
    /// row stays behind with no slots.
    ///
    /// # Returns
    /// * `Ok(i64)` - Id of the new timetable
    /// * `Err(Conflicts)` - If any faculty is already booked elsewhere
    /// * `Err` - If a conflict lookup or write fails
    pub fn save_timetable(
        &self,
        inputs: &TimetableInputs,
        grid: &WeeklyGrid,
    ) -> Result<i64, TimetableError> {
        let validation = validate_grid(self, grid)?;
        if !validation.valid {
            return Err(TimetableError::Conflicts {
                conflicts: validation.conflicts,
            });
        }

        self.upsert_faculty(&inputs.courses)?;

        let timetable_id = self.insert_timetable(inputs)?;

        match self.insert_slots(timetable_id, grid) {
            Ok(count) => {
                info!(
                    "Saved timetable {} ({} - {}) with {} slots",
                    timetable_id, inputs.department, inputs.semester, count
                );
                Ok(timetable_id)
            }
            Err(e) => {
                error!("Failed to save slots for timetable {}: {}", timetable_id, e);
                Err(e)
            }
        }
    }

    /// Gets every saved timetable, newest first
    pub fn get_all_timetables(&self) -> Result<Vec<DbTimetable>, TimetableError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT id, department, semester, block, classroom, created_at, user_id
             FROM timetables
             ORDER BY created_at DESC, id DESC",
        )?;

        let timetables = stmt.query_map([], timetable_from_row)?;
        Ok(timetables.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Gets a timetable and its slots, ordered by day then slot number
    pub fn get_timetable_by_id(&self, timetable_id: i64) -> Result<DbTimetableWithSlots, TimetableError> {
        let db = self.conn()?;

        let mut stmt = db.prepare(
            "SELECT id, department, semester, block, classroom, created_at, user_id
             FROM timetables
             WHERE id = ?",
        )?;
        let timetable = stmt
            .query_map([timetable_id], timetable_from_row)?
            .next()
            .transpose()?
            .ok_or(TimetableError::NotFound { id: timetable_id })?;

        let mut slot_stmt = db.prepare(&format!(
            "SELECT {SLOT_COLUMNS}
             FROM timetable_slots s
             LEFT JOIN faculty f ON f.faculty_id = s.faculty_id
             WHERE s.timetable_id = ?
             ORDER BY s.day, s.slot_number"
        ))?;
        let slots = slot_stmt
            .query_map([timetable_id], slot_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(DbTimetableWithSlots { timetable, slots })
    }

    /// Deletes a timetable and its slots. Returns false if it didn't exist.
    pub fn delete_timetable(&self, timetable_id: i64) -> Result<bool, TimetableError> {
        let db = self.conn()?;
        db.execute(
            "DELETE FROM timetable_slots WHERE timetable_id = ?",
            [timetable_id],
        )?;
        let removed = db.execute("DELETE FROM timetables WHERE id = ?", [timetable_id])?;
        Ok(removed > 0)
    }

    /// Gets every saved booking of a faculty member
    pub fn get_faculty_availability(
        &self,
        faculty_id: &str,
    ) -> Result<Vec<FacultyBooking>, TimetableError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT s.day, s.slot_number, s.subject, t.department, t.semester, t.block
             FROM timetable_slots s
             JOIN timetables t ON t.id = s.timetable_id
             WHERE s.faculty_id = ?
             ORDER BY s.day, s.slot_number",
        )?;

        let bookings = stmt.query_map([faculty_id], |row| {
            let slot_number: i64 = row.get(1)?;
            let department: String = row.get(3)?;
            let semester: String = row.get(4)?;
            let block: String = row.get(5)?;
            Ok(FacultyBooking {
                day: row.get(0)?,
                slot: slot_number as u32 + 1,
                subject: row.get(2)?,
                timetable: timetable_label(&department, &semester, &block),
            })
        })?;

        Ok(bookings.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl ConflictOracle for TimetableDbManager {
    /// Any failure of the lookup, including lock and statement errors, is a
    /// `ConflictCheck` error.
    fn check_conflicts(
        &self,
        day: &str,
        slot_index: usize,
        faculty_id: &str,
    ) -> Result<Vec<FacultyConflict>, TimetableError> {
        self.query_conflicts(day, slot_index, faculty_id)
            .map_err(|e| match e {
                TimetableError::Database { message } => TimetableError::ConflictCheck { message },
                other => other,
            })
    }
}

impl TimetableDbManager {
    fn query_conflicts(
        &self,
        day: &str,
        slot_index: usize,
        faculty_id: &str,
    ) -> Result<Vec<FacultyConflict>, TimetableError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT t.department, t.semester, t.block
             FROM timetable_slots s
             JOIN timetables t ON t.id = s.timetable_id
             WHERE s.day = ?1 AND s.slot_number = ?2 AND s.faculty_id = ?3",
        )?;

        let conflicts = stmt.query_map((day, slot_index as i64, faculty_id), |row| {
            let department: String = row.get(0)?;
            let semester: String = row.get(1)?;
            let block: String = row.get(2)?;
            Ok(FacultyConflict {
                timetable: timetable_label(&department, &semester, &block),
                department,
                semester,
                day: day.to_string(),
                slot: slot_index as u32 + 1,
            })
        })?;

        let conflicts = conflicts.collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(
            "{} conflicts for {} on {} slot {}",
            conflicts.len(),
            faculty_id,
            day,
            slot_index + 1
        );

        Ok(conflicts)
    }
}

impl DbTimetableWithSlots {
    /// Rebuilds the grid of a saved timetable.
    ///
    /// Rows on days or slots outside `config` are skipped.
    pub fn to_grid(&self, config: &GridConfig) -> WeeklyGrid {
        let mut grid = WeeklyGrid::new(config);

        for slot in &self.slots {
            let Some(column) = grid.days.iter_mut().find(|c| c.day == slot.day) else {
                debug!("Skipping slot on unknown day {}", slot.day);
                continue;
            };
            let index = slot.slot_number as usize;
            if slot.slot_number < 0 || index >= column.slots.len() || index == config.break_index {
                continue;
            }
            column.slots[index] = Some(SlotEntry {
                course_code: slot.course_code.clone().unwrap_or_default(),
                subject: slot.subject.clone(),
                faculty_name: slot.faculty_name.clone().unwrap_or_default(),
                faculty_id: slot.faculty_id.clone(),
            });
        }

        grid
    }
}

fn timetable_from_row(row: &Row<'_>) -> rusqlite::Result<DbTimetable> {
    Ok(DbTimetable {
        id: row.get(0)?,
        department: row.get(1)?,
        semester: row.get(2)?,
        block: row.get(3)?,
        classroom: row.get(4)?,
        created_at: row.get(5)?,
        user_id: row.get(6)?,
    })
}

fn slot_from_row(row: &Row<'_>) -> rusqlite::Result<DbTimetableSlot> {
    Ok(DbTimetableSlot {
        id: row.get(0)?,
        timetable_id: row.get(1)?,
        day: row.get(2)?,
        slot_number: row.get(3)?,
        subject: row.get(4)?,
        faculty_id: row.get(5)?,
        course_code: row.get(6)?,
        faculty_name: row.get(7)?,
    })
}
