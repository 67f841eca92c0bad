use axum::http::HeaderMap;

use crate::timetable::SessionKey;

/// Header carrying the client's session token
pub const SESSION_HEADER: &str = "x-session-id";

/// Gets the session key for a request, if it sent a session token
pub fn session_key(headers: &HeaderMap) -> Option<SessionKey> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(SessionKey::from_token)
}
