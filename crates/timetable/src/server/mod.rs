use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::server::endpoints::{faculty, session, status, timetable};
use crate::types::AppState;

mod endpoints;
pub mod types;
pub mod util;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Generation and conflict checking
    let generator_router = Router::new()
        .route("/generate", post(timetable::post_generate))
        .route("/faculty_load", post(timetable::post_faculty_load))
        .route("/conflicts", get(timetable::get_conflicts))
        .route("/validate", post(timetable::post_validate));

    // Saved timetables
    let saved_router = Router::new()
        .route(
            "/timetables",
            get(timetable::get_timetables).post(timetable::post_save_timetable),
        )
        .route(
            "/timetables/:id",
            get(timetable::get_timetable).delete(timetable::delete_timetable),
        )
        .route(
            "/faculty/:faculty_id/availability",
            get(faculty::get_availability),
        );

    Router::new()
        .route("/health", get(status::get_health))
        .route("/config/grid", get(status::get_grid_config))
        .route(
            "/session",
            get(session::get_session).delete(session::delete_session),
        )
        .merge(generator_router)
        .merge(saved_router)
        .with_state(app_state)
}
