/// Configuration for the timetable service and the weekly grid shape
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::timetable::TimetableError;

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// How long an idle session's cached form state is kept
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default)]
    pub grid: GridConfig,
}

/// Shape of the weekly grid and the limits applied to it.
///
/// `days` doubles as the fallback order the placement engine walks when the
/// randomly chosen day has no room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridConfig {
    #[serde(default = "default_days")]
    pub days: Vec<String>,
    #[serde(default = "default_slot_timings")]
    pub slot_timings: Vec<String>,
    #[serde(default = "default_break_index")]
    pub break_index: usize,
    #[serde(default = "default_break_time")]
    pub break_time: String,
    #[serde(default = "default_faculty_load_limit")]
    pub faculty_load_limit: u32,
    #[serde(default = "default_max_consecutive")]
    pub max_consecutive: u32,
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_path() -> String {
    "timetables.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_ttl_secs() -> u64 {
    60 * 60
}

fn default_days() -> Vec<String> {
    ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

// 8:00 AM - 4:35 PM, 50-minute slots
fn default_slot_timings() -> Vec<String> {
    [
        "8:00 - 8:50",
        "8:50 - 9:40",
        "9:40 - 10:30",
        "10:45 - 11:35",
        "11:35 - 12:25",
        "12:25 - 1:15",
        "1:15 - 2:05",
        "2:05 - 2:55",
        "2:55 - 3:45",
        "3:45 - 4:35",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_break_index() -> usize {
    3
}

fn default_break_time() -> String {
    "10:30 - 10:45".to_string()
}

fn default_faculty_load_limit() -> u32 {
    10
}

fn default_max_consecutive() -> u32 {
    9
}

impl GridConfig {
    /// Number of slot positions in one day, break included
    pub fn slots_per_day(&self) -> usize {
        self.slot_timings.len()
    }

    /// Returns true if `index` is the reserved break position
    pub fn is_break(&self, index: usize) -> bool {
        index == self.break_index
    }

    /// Returns true if `day` is one of the configured days
    pub fn has_day(&self, day: &str) -> bool {
        self.days.iter().any(|d| d == day)
    }

    /// Checks the grid shape is usable by the placement engine
    pub fn validate(&self) -> Result<(), TimetableError> {
        if self.days.is_empty() {
            return Err(TimetableError::InvalidConfig {
                message: "at least one day is required".to_string(),
            });
        }

        if self.slot_timings.is_empty() {
            return Err(TimetableError::InvalidConfig {
                message: "at least one slot is required".to_string(),
            });
        }

        if self.break_index >= self.slots_per_day() {
            return Err(TimetableError::InvalidConfig {
                message: format!(
                    "break index {} is outside a {}-slot day",
                    self.break_index,
                    self.slots_per_day()
                ),
            });
        }

        let mut seen = HashSet::new();
        for day in &self.days {
            if !seen.insert(day.as_str()) {
                return Err(TimetableError::InvalidConfig {
                    message: format!("day {} is listed twice", day),
                });
            }
        }

        if self.max_consecutive == 0 {
            return Err(TimetableError::InvalidConfig {
                message: "max_consecutive must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            days: default_days(),
            slot_timings: default_slot_timings(),
            break_index: default_break_index(),
            break_time: default_break_time(),
            faculty_load_limit: default_faculty_load_limit(),
            max_consecutive: default_max_consecutive(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to the JSON config file
    ///
    /// # Returns
    /// * `Ok(AppConfig)` - Loaded configuration, with defaults for missing fields
    /// * `Err` - If the file can't be read/parsed or the grid shape is invalid
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.grid.validate()?;
        Ok(config)
    }

    /// Loads the config file if it exists, otherwise falls back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        match path {
            Some(p) if p.exists() => Self::load_from_file(p),
            _ => Ok(Self::default()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            database_path: default_database_path(),
            log_level: default_log_level(),
            session_ttl_secs: default_session_ttl_secs(),
            grid: GridConfig::default(),
        }
    }
}
