//! Weekly timetable generation with faculty conflict checking across saved
//! timetables.

pub mod config;
pub mod db;
pub mod server;
pub mod timetable;
pub mod types;
