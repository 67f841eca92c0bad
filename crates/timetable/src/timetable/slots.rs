//! Slot timing labels and the display rendering of grid cells.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::config::GridConfig;

use super::types::{SlotEntry, WeeklyGrid};

// subject<br/><span ...>(faculty name)<br/>faculty id</span>
static CELL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)<br/><span[^>]*>\(([^)]+)\)<br/>(.+?)</span>$").unwrap()
});

/// Label for a slot position, e.g. `8:00 - 8:50`
pub fn slot_timing(config: &GridConfig, index: usize) -> String {
    config
        .slot_timings
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("Slot {}", index + 1))
}

/// Renders a cell into the HTML snippet the timetable view displays
pub fn render_cell(entry: &SlotEntry) -> String {
    format!(
        "{}<br/><span class=\"text-xs text-gray-600\">({})<br/>{}</span>",
        entry.subject, entry.faculty_name, entry.faculty_id
    )
}

/// Parses a rendered cell back into its entry.
///
/// The course code isn't part of the rendered form, so it comes back empty.
pub fn parse_cell(cell: &str) -> Option<SlotEntry> {
    let caps = CELL_REGEX.captures(cell)?;
    Some(SlotEntry {
        course_code: String::new(),
        subject: caps.get(1)?.as_str().to_string(),
        faculty_name: caps.get(2)?.as_str().to_string(),
        faculty_id: caps.get(3)?.as_str().to_string(),
    })
}

impl fmt::Display for SlotEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_cell(self))
    }
}

/// Returned when a string isn't a rendered cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognisedCell;

impl fmt::Display for UnrecognisedCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("cell does not match the rendered slot template")
    }
}

impl std::error::Error for UnrecognisedCell {}

impl FromStr for SlotEntry {
    type Err = UnrecognisedCell;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_cell(s).ok_or(UnrecognisedCell)
    }
}

/// One day of a rendered grid; empty cells are empty strings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderedDay {
    pub day: String,
    pub cells: Vec<String>,
}

/// Renders every cell of a grid for display
pub fn render_grid(grid: &WeeklyGrid) -> Vec<RenderedDay> {
    grid.days
        .iter()
        .map(|column| RenderedDay {
            day: column.day.clone(),
            cells: column
                .slots
                .iter()
                .map(|cell| cell.as_ref().map(render_cell).unwrap_or_default())
                .collect(),
        })
        .collect()
}

/// A labelled slot column of the timetable view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotLabel {
    pub index: usize,
    pub number: usize,
    pub timing: String,
    pub is_break: bool,
}

/// Everything a client needs to draw an empty week
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridLayout {
    pub days: Vec<String>,
    pub slots: Vec<SlotLabel>,
    pub break_index: usize,
    pub break_time: String,
    pub faculty_load_limit: u32,
    pub max_consecutive: u32,
}

/// Describes the configured week
pub fn grid_layout(config: &GridConfig) -> GridLayout {
    GridLayout {
        days: config.days.clone(),
        slots: (0..config.slots_per_day())
            .map(|index| SlotLabel {
                index,
                number: index + 1,
                timing: slot_timing(config, index),
                is_break: config.is_break(index),
            })
            .collect(),
        break_index: config.break_index,
        break_time: config.break_time.clone(),
        faculty_load_limit: config.faculty_load_limit,
        max_consecutive: config.max_consecutive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smith() -> SlotEntry {
        SlotEntry {
            course_code: "CS201".to_string(),
            subject: "Data Structures".to_string(),
            faculty_name: "Dr. Smith".to_string(),
            faculty_id: "F001".to_string(),
        }
    }

    #[test]
    fn test_rendered_cell_parses_back() {
        let rendered = render_cell(&smith());
        let parsed: SlotEntry = rendered.parse().unwrap();
        assert_eq!(parsed.subject, "Data Structures");
        assert_eq!(parsed.faculty_id, "F001");
        assert_eq!(parsed.faculty_name, "Dr. Smith");
    }

    #[test]
    fn test_plain_text_is_not_a_cell() {
        assert!(parse_cell("Data Structures").is_none());
        assert!(parse_cell("").is_none());
        assert_eq!("Lunch".parse::<SlotEntry>(), Err(UnrecognisedCell));
    }

    #[test]
    fn test_slot_timing_falls_back_to_number() {
        let config = GridConfig::default();
        assert_eq!(slot_timing(&config, 0), "8:00 - 8:50");
        assert_eq!(slot_timing(&config, 9), "3:45 - 4:35");
        assert_eq!(slot_timing(&config, 12), "Slot 13");
    }

    #[test]
    fn test_layout_marks_break() {
        let layout = grid_layout(&GridConfig::default());
        assert_eq!(layout.slots.len(), 10);
        assert!(layout.slots[3].is_break);
        assert_eq!(layout.slots.iter().filter(|s| s.is_break).count(), 1);
        assert_eq!(layout.break_time, "10:30 - 10:45");
    }

    #[test]
    fn test_render_grid_uses_empty_strings() {
        let mut grid = WeeklyGrid::new(&GridConfig::default());
        grid.days[0].slots[0] = Some(smith());
        let rendered = render_grid(&grid);
        assert_eq!(rendered[0].cells[0], render_cell(&smith()));
        assert_eq!(rendered[0].cells[1], "");
        assert_eq!(rendered[5].day, "Saturday");
    }
}
