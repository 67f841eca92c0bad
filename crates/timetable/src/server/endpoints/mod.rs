pub mod faculty;
pub mod session;
pub mod status;
pub mod timetable;
