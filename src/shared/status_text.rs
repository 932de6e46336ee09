//! HTTP reason phrases.

use hyper::StatusCode;

/// Returns the canonical reason phrase for a status code, or an empty
/// string for codes without one (including the `0` used for failed requests).
pub fn status_text(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
        .to_string()
}
