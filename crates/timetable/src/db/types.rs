/// Database types for saved timetables
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbFaculty {
    pub faculty_id: String,
    pub faculty_name: String,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbTimetable {
    pub id: i64,
    pub department: String,
    pub semester: String,
    pub block: String,
    pub classroom: String,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<String>,
}

impl DbTimetable {
    /// Display label used in conflict messages, e.g. `CSE - Semester 3 (AB1)`
    pub fn label(&self) -> String {
        timetable_label(&self.department, &self.semester, &self.block)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbTimetableSlot {
    pub id: i64,
    pub timetable_id: i64,
    pub day: String,
    pub slot_number: i64, // 0-based
    pub subject: String,
    pub faculty_id: String,
    pub course_code: Option<String>,
    pub faculty_name: Option<String>, // from the faculty table
}

/// A saved timetable with all of its slot rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbTimetableWithSlots {
    pub timetable: DbTimetable,
    pub slots: Vec<DbTimetableSlot>,
}

/// One booking of a faculty member, as shown on the availability view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FacultyBooking {
    pub day: String,
    pub slot: u32, // 1-based
    pub subject: String,
    pub timetable: String,
}

pub(crate) fn timetable_label(department: &str, semester: &str, block: &str) -> String {
    format!("{} - {} ({})", department, semester, block)
}
