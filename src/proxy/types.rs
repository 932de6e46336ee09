use crate::error::AppError;
use crate::shared::normalize_url;
use hyper::Method;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use url::Url;

/// Default timeout for proxied requests in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Proxy request as sent by the browser; every field is optional until
/// validated.
#[derive(Debug, Default, Deserialize)]
pub struct ProxyRequestBody {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    /// Strings are forwarded verbatim, other JSON values as their encoding.
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    /// Timeout in milliseconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// A validated proxy request.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub url: Url,
    /// Caller-supplied headers with lower-cased names.
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub timeout_ms: u64,
}

impl ProxyRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HashMap::new(),
            body: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Whether a body may be forwarded with this method.
    pub fn carries_body(&self) -> bool {
        self.method != Method::GET && self.method != Method::HEAD
    }
}

impl TryFrom<ProxyRequestBody> for ProxyRequest {
    type Error = AppError;

    fn try_from(raw: ProxyRequestBody) -> Result<Self, Self::Error> {
        let url = raw
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::BadRequest("URL is required".to_string()))?;
        let url = normalize_url(url).map_err(AppError::BadRequest)?;

        let method = match raw.method.as_deref().map(str::trim) {
            None | Some("") => Method::GET,
            Some(m) => Method::from_str(&m.to_ascii_uppercase())
                .map_err(|_| AppError::BadRequest(format!("Invalid method: {}", m)))?,
        };

        let headers = raw
            .headers
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v))
            .collect();

        let body = raw.body.and_then(|value| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });

        Ok(Self {
            method,
            url,
            headers,
            body,
            timeout_ms: raw.timeout.unwrap_or(DEFAULT_TIMEOUT_MS),
        })
    }
}

/// Timing of the proxied exchange.
///
/// `start` and `end` are milliseconds on the server's monotonic clock; the
/// phase fields are only present when the phase was observed.
#[derive(Debug, Clone, Serialize, Default)]
pub struct TimingInfo {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttfb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<u64>,
}

/// TLS details of the first hop.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsSummary {
    pub protocol: String,
    pub cipher: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<String>,
}

/// Proxy response. `success` reflects the proxied request, not this call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub success: bool,
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub url: String,
    pub redirected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    pub timing: TimingInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProxyResponse {
    pub fn failure(url: &str, error: impl Into<String>, timing: TimingInfo) -> Self {
        Self {
            success: false,
            status: 0,
            status_text: String::new(),
            headers: BTreeMap::new(),
            body: String::new(),
            url: url.to_string(),
            redirected: false,
            final_url: None,
            timing,
            tls: None,
            error: Some(error.into()),
        }
    }
}
