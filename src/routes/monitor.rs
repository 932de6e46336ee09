use super::invalid_json;
use crate::monitor::{check_website, MonitorRequest, MonitorResult, DEFAULT_TIMEOUT_MS};
use crate::shared::normalize_url;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

fn rejected(url: &str, error: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(MonitorResult::offline(url, error))).into_response()
}

/// Validation failures answer with the zeroed result shape rather than the
/// generic error body.
pub async fn website_monitor(payload: Result<Json<MonitorRequest>, JsonRejection>) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(e) => return rejected("", invalid_json(e)),
    };

    let raw = match request.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(raw) => raw,
        None => return rejected("", "URL is required"),
    };
    let url = match normalize_url(raw) {
        Ok(url) => url,
        Err(e) => return rejected(raw, e),
    };

    let timeout_ms = request.timeout.unwrap_or(DEFAULT_TIMEOUT_MS);
    tracing::debug!(url = %url, timeout_ms, "Monitoring website");

    Json(check_website(&url, timeout_ms).await).into_response()
}
