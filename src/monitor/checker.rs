//! Website availability check.
//!
//! Fetches the page once, reads the full body, then derives metadata,
//! security flags and heuristic scores from what came back.

use super::types::{MonitorResult, PerformanceMetrics, SiteStatus};
use super::{lighthouse, metadata, security};
use crate::infra::decompress_body;
use crate::shared::status_text;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, CONTENT_ENCODING};
use reqwest::StatusCode;
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use url::Url;

/// Default timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Same ceiling as the proxy.
const MAX_REDIRECTS: usize = 20;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; DevToolsHubMonitor/1.0)";

impl PerformanceMetrics {
    /// Splits one measured duration into fixed shares. `ssl` is only
    /// attributed for https targets.
    pub fn estimate(total_ms: u64, https: bool) -> Self {
        let share = |fraction: f64| (total_ms as f64 * fraction).round() as u64;
        Self {
            dns: share(0.10),
            connect: share(0.15),
            ssl: if https { share(0.10) } else { 0 },
            ttfb: share(0.40),
            download: share(0.25),
            total: total_ms,
        }
    }
}

/// Renders an error with its source chain, e.g. `error sending request: connection refused`.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    // Decoded locally so `content-encoding` stays visible to the heuristics.
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));

    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .pool_max_idle_per_host(0)
        .build()
}

/// Turns a received response into a full monitor result.
pub fn evaluate(
    url: &Url,
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
    total_ms: u64,
) -> MonitorResult {
    let encoding = headers.get(CONTENT_ENCODING).and_then(|v| v.to_str().ok());
    let decoded = decompress_body(body, encoding).unwrap_or_else(|e| {
        tracing::debug!(url = %url, error = %e, "Falling back to raw body");
        body.to_vec()
    });
    let html = String::from_utf8_lossy(&decoded);

    let metadata = metadata::extract_metadata(&html, headers);
    let security = security::assess(url.as_str(), headers);
    let lighthouse = lighthouse::estimate(&html, headers, &metadata, &security);

    let site_status = if status.as_u16() < 400 {
        SiteStatus::Online
    } else {
        SiteStatus::Degraded
    };

    MonitorResult {
        success: true,
        url: url.to_string(),
        status: site_status,
        status_code: status.as_u16(),
        status_text: status_text(status.as_u16()),
        response_time: total_ms,
        timestamp: chrono::Utc::now().to_rfc3339(),
        error: None,
        performance: PerformanceMetrics::estimate(total_ms, security.https),
        metadata,
        security,
        lighthouse,
    }
}

/// Fetches `url` and grades the response. Never fails: unreachable sites
/// come back as `offline` results.
pub async fn check_website(url: &Url, timeout_ms: u64) -> MonitorResult {
    let client = match build_client() {
        Ok(c) => c,
        Err(e) => return MonitorResult::offline(url.as_str(), error_chain(&e)),
    };

    let started = Instant::now();
    let fetch = async {
        let response = client.get(url.clone()).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok::<_, reqwest::Error>((status, headers, body))
    };

    // On timeout the fetch future, and the connection it owns, is dropped.
    match timeout(Duration::from_millis(timeout_ms), fetch).await {
        Ok(Ok((status, headers, body))) => {
            let total_ms = started.elapsed().as_millis() as u64;
            tracing::debug!(url = %url, status = status.as_u16(), duration_ms = total_ms, "Website check finished");
            evaluate(url, status, &headers, &body, total_ms)
        }
        Ok(Err(e)) => {
            let message = error_chain(&e);
            tracing::warn!(url = %url, error = %message, "Website check failed");
            MonitorResult::offline(url.as_str(), message)
        }
        Err(_) => {
            tracing::warn!(url = %url, timeout_ms, "Website check timed out");
            MonitorResult::offline(url.as_str(), "Request timeout")
        }
    }
}
