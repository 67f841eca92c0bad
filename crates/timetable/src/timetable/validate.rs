//! Checks on submitted timetable inputs before anything is generated.

use crate::config::GridConfig;

use super::error::TimetableError;
use super::types::TimetableInputs;

/// Validates the form fields and keeps only complete courses.
///
/// # Returns
/// * `Ok(TimetableInputs)` - Inputs with incomplete courses dropped and block
///   sizes normalized
/// * `Err(MissingField)` - If department, semester, block or classroom is empty
/// * `Err(NoValidCourses)` - If no complete course remains
pub fn validate_inputs(
    inputs: &TimetableInputs,
    config: &GridConfig,
) -> Result<TimetableInputs, TimetableError> {
    let fields = [
        ("department", &inputs.department),
        ("semester", &inputs.semester),
        ("block", &inputs.block),
        ("classroom", &inputs.classroom),
    ];

    if let Some((field, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(TimetableError::MissingField {
            field: field.to_string(),
        });
    }

    let courses: Vec<_> = inputs
        .courses
        .iter()
        .filter(|c| c.is_complete())
        .map(|c| c.clone().normalized(config.max_consecutive))
        .collect();

    if courses.is_empty() {
        return Err(TimetableError::NoValidCourses);
    }

    Ok(TimetableInputs {
        courses,
        ..inputs.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::types::Course;

    fn inputs(courses: Vec<Course>) -> TimetableInputs {
        TimetableInputs {
            department: "CSE".to_string(),
            semester: "Semester 3".to_string(),
            block: "AB1".to_string(),
            classroom: "101".to_string(),
            courses,
        }
    }

    fn course(code: &str, slots: u32) -> Course {
        Course {
            course_code: code.to_string(),
            subject: "Data Structures".to_string(),
            faculty: "Dr. Smith".to_string(),
            faculty_id: "F001".to_string(),
            slots,
            consecutive: false,
            consecutive_slots: 4,
        }
    }

    #[test]
    fn test_missing_field_reported() {
        let mut form = inputs(vec![course("CS201", 3)]);
        form.block = "  ".to_string();
        match validate_inputs(&form, &GridConfig::default()) {
            Err(TimetableError::MissingField { field }) => assert_eq!(field, "block"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_incomplete_courses_dropped() {
        let form = inputs(vec![course("", 3), course("CS201", 0), course("CS202", 2)]);
        let cleaned = validate_inputs(&form, &GridConfig::default()).unwrap();
        assert_eq!(cleaned.courses.len(), 1);
        assert_eq!(cleaned.courses[0].course_code, "CS202");
        assert_eq!(cleaned.courses[0].consecutive_slots, 1);
        assert_eq!(cleaned.department, "CSE");
    }

    #[test]
    fn test_no_valid_courses() {
        let form = inputs(vec![course("", 3)]);
        assert!(matches!(
            validate_inputs(&form, &GridConfig::default()),
            Err(TimetableError::NoValidCourses)
        ));
    }
}
