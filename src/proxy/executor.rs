//! HTTP request execution with detailed timing and TLS information.
//!
//! Every call opens its own connections (one per redirect hop) and tears
//! them down before returning. The whole exchange, redirects included, runs
//! under a single deadline; when it fires the in-flight future is dropped,
//! which closes the socket and aborts the connection task.

use super::response_builder::{build_response, Exchange};
use super::types::*;
use crate::infra::{connect_tls, resolve_socket_addr, RustlsTlsProvider};
use crate::shared::cert_parser::negotiated_session;
use crate::shared::timing::Phase;
use crate::shared::{DetailedTiming, NegotiatedSession};
use http_body_util::{BodyExt, Full};
use hyper::{body::Bytes, header::HeaderName, HeaderMap, Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use std::{collections::BTreeMap, str::FromStr, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
    task::JoinHandle,
    time::timeout,
};
use url::Url;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 20;

/// Browser-like defaults; caller headers override them.
const DEFAULT_HEADERS: [(&str, &str); 4] = [
    (
        "user-agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    ),
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,application/json;q=0.9,*/*;q=0.8",
    ),
    ("accept-language", "en-US,en;q=0.9"),
    ("accept-encoding", "gzip, deflate, br"),
];

/// Headers that only apply to a single transport hop.
pub const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Headers recomputed for every hop.
const CONNECTION_MANAGED_HEADERS: [&str; 2] = ["host", "content-length"];

/// Merges caller headers over the defaults and strips hop-by-hop headers.
pub fn outbound_headers(caller: &std::collections::HashMap<String, String>) -> BTreeMap<String, String> {
    let mut merged: BTreeMap<String, String> = DEFAULT_HEADERS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    for (name, value) in caller {
        merged.insert(name.to_ascii_lowercase(), value.clone());
    }

    merged.retain(|name, _| {
        !HOP_BY_HOP_HEADERS.contains(&name.as_str())
            && !CONNECTION_MANAGED_HEADERS.contains(&name.as_str())
    });
    merged
}

/// Method and body for the next hop, following browser fetch semantics.
fn redirect_method(status: StatusCode, method: &Method) -> (Method, bool) {
    match status.as_u16() {
        303 if method != Method::HEAD => (Method::GET, false),
        301 | 302 if method == Method::POST => (Method::GET, false),
        _ => (method.clone(), true),
    }
}

/// Aborts the spawned connection driver when the exchange is finished or
/// abandoned.
struct ConnectionTask(JoinHandle<()>);

impl Drop for ConnectionTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Target of a single hop.
struct RequestContext {
    url: Url,
    host: String,
    port: u16,
    is_https: bool,
}

impl RequestContext {
    fn from_url(url: &Url) -> Result<Self, String> {
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| "URL has no host".to_string())?
            .to_string();

        let is_https = match url.scheme() {
            "https" => true,
            "http" => false,
            other => return Err(format!("Unsupported scheme: {}", other)),
        };

        Ok(Self {
            url: url.clone(),
            host,
            port: url.port_or_known_default().unwrap_or(if is_https { 443 } else { 80 }),
            is_https,
        })
    }

    /// `path?query` in origin form.
    fn origin_form(&self) -> String {
        match self.url.query() {
            Some(q) => format!("{}?{}", self.url.path(), q),
            None => self.url.path().to_string(),
        }
    }

    fn host_header(&self) -> String {
        let default_port = if self.is_https { 443 } else { 80 };
        if self.port == default_port {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Raw outcome of one hop.
struct HopResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

fn build_http_request(
    ctx: &RequestContext,
    method: &Method,
    headers: &BTreeMap<String, String>,
    body: Option<&str>,
) -> Result<Request<Full<Bytes>>, String> {
    let mut req_builder = Request::builder()
        .method(method.clone())
        .uri(ctx.origin_form())
        .header("host", ctx.host_header());

    for (key, value) in headers {
        if let Ok(name) = HeaderName::from_str(key) {
            req_builder = req_builder.header(name, value);
        }
    }

    let body_content = body.map(str::to_owned).unwrap_or_default();
    req_builder
        .body(Full::new(Bytes::from(body_content)))
        .map_err(|e| format!("Failed to build request: {}", e))
}

/// Sends one request over an established transport and reads the full body.
async fn exchange_over<T>(
    io: T,
    req: Request<Full<Bytes>>,
    timing: &mut DetailedTiming,
    is_first_request: bool,
) -> Result<HopResponse, String>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(io))
        .await
        .map_err(|e| format!("HTTP handshake failed: {}", e))?;

    let _task = ConnectionTask(tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("Connection closed with error: {}", e);
        }
    }));

    if is_first_request {
        timing.begin(Phase::Ttfb);
    }

    let response = sender
        .send_request(req)
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if is_first_request {
        timing.end(Phase::Ttfb);
        timing.begin(Phase::Download);
    }

    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| format!("Failed to read body: {}", e))?
        .to_bytes()
        .to_vec();

    if is_first_request {
        timing.end(Phase::Download);
    }

    Ok(HopResponse {
        status,
        headers,
        body,
    })
}

/// Performs a single hop: resolve, connect, optional TLS, request.
async fn execute_hop(
    ctx: &RequestContext,
    method: &Method,
    headers: &BTreeMap<String, String>,
    body: Option<&str>,
    timing: &mut DetailedTiming,
    tls_info: &mut Option<NegotiatedSession>,
    is_first_request: bool,
) -> Result<HopResponse, String> {
    if is_first_request {
        timing.begin(Phase::Dns);
    }
    let addr = resolve_socket_addr(&ctx.host, ctx.port).await?;
    if is_first_request {
        timing.end(Phase::Dns);
        timing.begin(Phase::Tcp);
    }

    let tcp_stream = TcpStream::connect(addr)
        .await
        .map_err(|e| format!("Connection to {} failed: {}", addr, e))?;
    if is_first_request {
        timing.end(Phase::Tcp);
    }

    let req = build_http_request(ctx, method, headers, body)?;

    if ctx.is_https {
        if is_first_request {
            timing.begin(Phase::Tls);
        }
        let tls_stream = connect_tls(&RustlsTlsProvider::new(), tcp_stream, &ctx.host).await?;
        if is_first_request {
            timing.end(Phase::Tls);
            *tls_info = Some(negotiated_session(&tls_stream));
        }
        exchange_over(tls_stream, req, timing, is_first_request).await
    } else {
        exchange_over(tcp_stream, req, timing, is_first_request).await
    }
}

/// Follows the redirect chain and returns the final exchange.
async fn run(request: &ProxyRequest, timing: &mut DetailedTiming) -> Result<Exchange, String> {
    let headers = outbound_headers(&request.headers);
    let mut ctx = RequestContext::from_url(&request.url)?;
    let mut method = request.method.clone();
    let mut body = if request.carries_body() {
        request.body.clone()
    } else {
        None
    };

    let mut tls_info: Option<NegotiatedSession> = None;
    let mut redirects = 0usize;

    loop {
        let hop = execute_hop(
            &ctx,
            &method,
            &headers,
            body.as_deref(),
            timing,
            &mut tls_info,
            redirects == 0,
        )
        .await?;

        let location = hop
            .headers
            .get(hyper::header::LOCATION)
            .and_then(|v| v.to_str().ok());

        if hop.status.is_redirection() {
            if let Some(location) = location {
                let next_url = ctx
                    .url
                    .join(location)
                    .map_err(|e| format!("Invalid redirect location '{}': {}", location, e))?;

                redirects += 1;
                if redirects > MAX_REDIRECTS {
                    return Err("Too many redirects".to_string());
                }

                tracing::debug!(
                    status = hop.status.as_u16(),
                    from = %ctx.url,
                    to = %next_url,
                    "Following redirect"
                );

                let (next_method, keep_body) = redirect_method(hop.status, &method);
                method = next_method;
                if !keep_body || method == Method::GET || method == Method::HEAD {
                    body = None;
                }
                ctx = RequestContext::from_url(&next_url)?;
                continue;
            }
        }

        return Ok(Exchange {
            status: hop.status,
            headers: hop.headers,
            body: hop.body,
            final_url: ctx.url,
            redirects,
            tls: tls_info,
        });
    }
}

/// Executes a proxy request. Never fails: problems are reported in the
/// returned `ProxyResponse`.
pub async fn execute_request(request: ProxyRequest) -> ProxyResponse {
    let mut timing = DetailedTiming::new();
    let deadline = Duration::from_millis(request.timeout_ms);

    let outcome = timeout(deadline, run(&request, &mut timing)).await;
    timing.finish();

    match outcome {
        Ok(Ok(exchange)) => build_response(&request.url, exchange, &timing),
        Ok(Err(message)) => {
            tracing::warn!(url = %request.url, error = %message, "Proxied request failed");
            ProxyResponse::failure(request.url.as_str(), message, timing.to_timing_info())
        }
        Err(_) => {
            tracing::warn!(url = %request.url, timeout_ms = request.timeout_ms, "Proxied request timed out");
            ProxyResponse::failure(
                request.url.as_str(),
                format!("Request timeout after {}ms", request.timeout_ms),
                timing.to_timing_info(),
            )
        }
    }
}
