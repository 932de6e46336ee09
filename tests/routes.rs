use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use devtools_hub::proxy::{ProxyRequest, ProxyResponse, ProxyService, TimingInfo};
use devtools_hub::{router, AppState};
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Records the requests it would have sent instead of sending them.
#[derive(Default)]
struct CountingService {
    seen: Mutex<Vec<String>>,
}

impl CountingService {
    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl ProxyService for CountingService {
    fn execute(
        &self,
        request: ProxyRequest,
    ) -> Pin<Box<dyn Future<Output = ProxyResponse> + Send + '_>> {
        Box::pin(async move {
            self.seen.lock().unwrap().push(request.url.to_string());
            let mut response =
                ProxyResponse::failure(request.url.as_str(), "unused", TimingInfo::default());
            response.success = true;
            response.status = 200;
            response.error = None;
            response
        })
    }
}

/// Panics inside the handler, as a bug in the transport would.
struct PanickingService;

impl ProxyService for PanickingService {
    fn execute(
        &self,
        _request: ProxyRequest,
    ) -> Pin<Box<dyn Future<Output = ProxyResponse> + Send + '_>> {
        Box::pin(async move { panic!("connection pool poisoned") })
    }
}

fn app() -> (axum::Router, Arc<CountingService>) {
    let service = Arc::new(CountingService::default());
    (router(AppState::new(service.clone())), service)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_private_targets_are_forbidden_without_network() {
    let (app, service) = app();

    for host in [
        "localhost",
        "127.0.0.1",
        "192.168.1.1",
        "10.0.0.5",
        "172.16.0.1",
        "foo.local",
    ] {
        let (status, body) = send(
            app.clone(),
            post_json("/api/proxy", json!({ "url": format!("http://{}:8080", host) })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", host);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("private/internal"));
    }

    assert!(service.seen().is_empty());
}

#[tokio::test]
async fn test_scheme_less_url_goes_out_as_https() {
    let (app, service) = app();

    let (status, body) = send(app, post_json("/api/proxy", json!({ "url": "example.com" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(service.seen(), vec!["https://example.com/".to_string()]);
}

#[tokio::test]
async fn test_get_convenience_endpoint() {
    let (app, service) = app();

    let (status, _) = send(app.clone(), get("/api/proxy?url=example.com%2Fpath")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(service.seen(), vec!["https://example.com/path".to_string()]);

    let (status, body) = send(app, get("/api/proxy")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "URL is required");
}

#[tokio::test]
async fn test_proxy_rejects_bad_method() {
    let (app, service) = app();

    let (status, body) = send(
        app,
        post_json("/api/proxy", json!({ "url": "example.com", "method": "GE T" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid method"));
    assert!(service.seen().is_empty());
}

#[tokio::test]
async fn test_ssl_check_requires_domain() {
    let (app, _) = app();

    let (status, body) = send(app.clone(), post_json("/api/ssl-check", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "error": "Domain is required" }));

    let (status, _) = send(app, post_json("/api/ssl-check", json!({ "domain": "https:///" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_monitor_requires_url_and_keeps_shape() {
    let (app, _) = app();

    let (status, body) = send(app, post_json("/api/website-monitor", json!({ "timeout": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], "offline");
    assert_eq!(body["error"], "URL is required");
    assert_eq!(body["statusCode"], 0);
    assert_eq!(body["security"]["score"], 0);
    assert_eq!(body["performance"]["total"], 0);
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let (app, _) = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/ssl-check")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/website-monitor")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("[1, 2"))
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "offline");
}

#[tokio::test]
async fn test_preflight_advertises_route_methods() {
    let (app, _) = app();

    for (uri, method) in [
        ("/api/ssl-check", "POST"),
        ("/api/proxy", "GET"),
        ("/api/proxy", "POST"),
        ("/api/website-monitor", "POST"),
    ] {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .header(header::ORIGIN, "https://devtools.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, method)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
        assert!(methods.contains(method) && methods.contains("OPTIONS"), "{}", methods);
        let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(allowed.contains("content-type") && allowed.contains("authorization"));
    }
}

#[tokio::test]
async fn test_unknown_path_and_wrong_method_are_json() {
    let (app, _) = app();

    let (status, body) = send(app.clone(), get("/api/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "error": "Not found" }));

    let (status, body) = send(app, get("/api/ssl-check")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "success": false, "error": "Method not allowed" }));
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app();

    let (status, body) = send(app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_handler_panic_becomes_generic_500() {
    let app = router(AppState::new(Arc::new(PanickingService)));

    let (status, body) = send(
        app,
        post_json("/api/proxy", json!({ "url": "https://example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "success": false, "error": "Internal server error" })
    );
}
