//! HTTP surface: route table, shared state and the JSON fallbacks.

pub mod health;
pub mod monitor;
pub mod proxy;
pub mod ssl;

use crate::error::AppError;
use crate::proxy::{HttpProxyService, ProxyService};
use axum::extract::rejection::JsonRejection;
use axum::http::{header, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::Router;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<dyn ProxyService>,
}

impl AppState {
    pub fn new(proxy: Arc<dyn ProxyService>) -> Self {
        Self { proxy }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(HttpProxyService::arc())
    }
}

/// CORS for one route. `tower-http` answers every `OPTIONS` request itself,
/// so this doubles as the route's preflight handler.
fn cors(methods: &[Method]) -> CorsLayer {
    let mut allowed = methods.to_vec();
    allowed.push(Method::OPTIONS);

    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(allowed)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub(crate) fn invalid_json(rejection: JsonRejection) -> String {
    format!("Invalid JSON body: {}", rejection.body_text())
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed("Method not allowed".to_string())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = %detail, "Handler panicked");

    AppError::Internal.into_response()
}

fn endpoint(route: MethodRouter<AppState>, methods: &[Method]) -> MethodRouter<AppState> {
    route.fallback(method_not_allowed).layer(cors(methods))
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", endpoint(get(health::health_check), &[Method::GET]))
        .route("/api/ssl-check", endpoint(post(ssl::ssl_check), &[Method::POST]))
        .route(
            "/api/proxy",
            endpoint(
                get(proxy::proxy_query).post(proxy::proxy_request),
                &[Method::GET, Method::POST],
            ),
        )
        .route(
            "/api/website-monitor",
            endpoint(post(monitor::website_monitor), &[Method::POST]),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}
