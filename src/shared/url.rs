//! Target URL normalisation shared by the proxy and the website monitor.

use url::Url;

/// Prefixes `https://` when the input carries no `http://` or `https://`
/// scheme, then parses it.
pub fn normalize_url(input: &str) -> Result<Url, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("URL is empty".to_string());
    }

    let lower = trimmed.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate).map_err(|e| format!("Invalid URL: {}", e))?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err("Invalid URL: missing host".to_string());
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_https_scheme() {
        let url = normalize_url("example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_keeps_http_scheme() {
        let url = normalize_url("http://example.com/path?q=1").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.path(), "/path");
        assert_eq!(url.query(), Some("q=1"));
    }

    #[test]
    fn test_scheme_match_is_case_insensitive() {
        let url = normalize_url("HTTPS://Example.com").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(normalize_url("").is_err());
        assert!(normalize_url("   ").is_err());
        assert!(normalize_url("http://").is_err());
        assert!(normalize_url("exa mple.com").is_err());
    }
}
