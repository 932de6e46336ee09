use super::invalid_json;
use crate::error::AppError;
use crate::ssl::{check_certificate, normalize_domain, SslCheckRequest, SslCheckResult, DEFAULT_PORT};
use axum::extract::rejection::JsonRejection;
use axum::Json;

pub async fn ssl_check(
    payload: Result<Json<SslCheckRequest>, JsonRejection>,
) -> Result<Json<SslCheckResult>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(invalid_json(e)))?;

    let domain = request
        .domain
        .as_deref()
        .map(normalize_domain)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::BadRequest("Domain is required".to_string()))?;
    let port = request.port.unwrap_or(DEFAULT_PORT);

    tracing::debug!(domain = %domain, port, "Checking certificate");
    Ok(Json(check_certificate(&domain, port).await))
}
