//! Target access policy for the proxy.
//!
//! The check is purely textual on the hostname as written in the URL. It is
//! not resolved first, so DNS rebinding, decimal/hex IPv4 notations and most
//! IPv6 forms are not caught. Redirect targets are not re-checked either.

use crate::error::AppError;
use url::Url;

pub const BLOCKED_MESSAGE: &str = "Access to private/internal addresses is not allowed";

const BLOCKED_PREFIXES: [&str; 4] = ["127.", "192.168.", "10.", "172."];

/// Whether `host` names a private or internal target.
pub fn is_blocked_host(host: &str) -> bool {
    let host = host
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_ascii_lowercase();

    host == "localhost"
        || host == "::1"
        || host.ends_with(".local")
        || BLOCKED_PREFIXES.iter().any(|p| host.starts_with(p))
}

pub fn check_target(url: &Url) -> Result<(), AppError> {
    match url.host_str() {
        Some(host) if is_blocked_host(host) => Err(AppError::Forbidden(BLOCKED_MESSAGE.to_string())),
        _ => Ok(()),
    }
}
