/// Shared application state handed to every request handler
use std::time::Duration;

use crate::config::AppConfig;
use crate::db::TimetableDbManager;
use crate::timetable::SessionStore;

pub struct AppState {
    pub config: AppConfig,
    pub timetable_db: TimetableDbManager,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: AppConfig, timetable_db: TimetableDbManager) -> Self {
        let sessions = SessionStore::new(Duration::from_secs(config.session_ttl_secs));
        Self {
            config,
            timetable_db,
            sessions,
        }
    }
}
