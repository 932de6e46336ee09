//! Response building utilities for proxy responses.
//!
//! Turns the final hop of an exchange into a `ProxyResponse`: headers are
//! flattened, the body is decoded to text and the first hop's TLS session
//! is summarised.

use super::types::*;
use crate::infra::decompress_body;
use crate::shared::cert_parser::unix_now;
use crate::shared::{parse_certificate, status_text, DetailedTiming, NegotiatedSession};
use hyper::{HeaderMap, StatusCode};
use std::collections::BTreeMap;
use url::Url;

/// Final hop of a proxied exchange.
pub struct Exchange {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub final_url: Url,
    pub redirects: usize,
    pub tls: Option<NegotiatedSession>,
}

/// Flattens a header map; repeated headers are joined with `", "`.
pub fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    flat
}

fn summarize_tls(session: NegotiatedSession) -> TlsSummary {
    let cert = session
        .leaf_der
        .as_deref()
        .and_then(|der| parse_certificate(der, unix_now()).ok());

    TlsSummary {
        protocol: session.protocol,
        cipher: session.cipher,
        subject: cert.as_ref().and_then(|c| c.common_name().map(str::to_string)),
        issuer: cert
            .as_ref()
            .and_then(|c| c.issuer_common_name().map(str::to_string)),
        valid_from: cert.as_ref().map(|c| c.valid_from.clone()),
        valid_to: cert.map(|c| c.valid_to),
    }
}

/// Builds the proxy response for a completed exchange.
///
/// # Arguments
///
/// * `requested` - The URL the caller asked for
/// * `exchange` - The final hop's status, headers, body and TLS session
/// * `timing` - The timing collected for the exchange
///
/// # Returns
///
/// A successful `ProxyResponse`, or a failed one if the body cannot be decoded.
pub fn build_response(requested: &Url, exchange: Exchange, timing: &DetailedTiming) -> ProxyResponse {
    let Exchange {
        status,
        headers,
        body,
        final_url,
        redirects,
        tls,
    } = exchange;

    let headers = flatten_headers(&headers);
    let decoded = match decompress_body(&body, headers.get("content-encoding").map(String::as_str)) {
        Ok(d) => d,
        Err(e) => {
            return ProxyResponse::failure(requested.as_str(), e, timing.to_timing_info());
        }
    };

    let final_url = (final_url != *requested).then(|| final_url.to_string());

    ProxyResponse {
        success: true,
        status: status.as_u16(),
        status_text: status_text(status.as_u16()),
        headers,
        body: String::from_utf8_lossy(&decoded).into_owned(),
        url: requested.to_string(),
        redirected: redirects > 0,
        final_url,
        timing: timing.to_timing_info(),
        tls: tls.map(summarize_tls),
        error: None,
    }
}
