use super::{invalid_json, AppState};
use crate::error::AppError;
use crate::proxy::{check_target, ProxyRequest, ProxyRequestBody, ProxyResponse};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

pub async fn proxy_request(
    State(state): State<AppState>,
    payload: Result<Json<ProxyRequestBody>, JsonRejection>,
) -> Result<Json<ProxyResponse>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::BadRequest(invalid_json(e)))?;
    forward(&state, body).await
}

/// `GET /api/proxy?url=...`: same as a POST carrying only the URL.
pub async fn proxy_query(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> Result<Json<ProxyResponse>, AppError> {
    let body = ProxyRequestBody {
        url: query.url,
        ..ProxyRequestBody::default()
    };
    forward(&state, body).await
}

async fn forward(state: &AppState, body: ProxyRequestBody) -> Result<Json<ProxyResponse>, AppError> {
    let request = ProxyRequest::try_from(body)?;

    if let Err(e) = check_target(&request.url) {
        tracing::warn!(url = %request.url, "Blocked proxy target");
        return Err(e);
    }

    tracing::debug!(
        method = %request.method,
        url = %request.url,
        "Proxying request"
    );

    let response = state.proxy.execute(request).await;

    if response.success {
        tracing::debug!(status = response.status, "Request succeeded");
    } else if let Some(ref error) = response.error {
        tracing::warn!(url = %response.url, error = %error, "Request failed");
    }

    Ok(Json(response))
}
