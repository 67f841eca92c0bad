//! Weekly teaching-load advisory for the course list being edited.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::types::Course;

/// A faculty member whose requested weekly slots exceed the limit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FacultyLoadWarning {
    pub faculty_id: String,
    pub total_slots: u64,
    pub limit: u32,
}

impl fmt::Display for FacultyLoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Faculty {} has {} slots (max {} allowed)",
            self.faculty_id, self.total_slots, self.limit
        )
    }
}

/// Sums requested slots per faculty id and flags every total above `limit`.
///
/// Only looks at `courses`; saved timetables aren't consulted. Courses with no
/// faculty id or no slots are ignored.
pub fn check_faculty_load(courses: &[Course], limit: u32) -> Vec<FacultyLoadWarning> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();

    for course in courses {
        let faculty_id = course.faculty_id.trim();
        if faculty_id.is_empty() || course.slots == 0 {
            continue;
        }
        let total = totals.entry(faculty_id).or_insert(0);
        *total = total.saturating_add(u64::from(course.slots));
    }

    totals
        .into_iter()
        .filter(|&(_, total)| total > u64::from(limit))
        .map(|(faculty_id, total_slots)| FacultyLoadWarning {
            faculty_id: faculty_id.to_string(),
            total_slots,
            limit,
        })
        .collect()
}
