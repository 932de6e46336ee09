//! Regex-based page metadata extraction.
//!
//! Deliberately not an HTML parser: the patterns match the raw markup
//! case-insensitively and take the first hit.

use super::types::Metadata;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED, SERVER};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 300;

static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<title[^>]*>([^<]*)</title>").unwrap());

static DESCRIPTION_NAME_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+name\s*=\s*["']description["'][^>]*content\s*=\s*["']([^"']*)["']"#)
        .unwrap()
});

static DESCRIPTION_CONTENT_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+content\s*=\s*["']([^"']*)["'][^>]*name\s*=\s*["']description["']"#)
        .unwrap()
});

static CHARSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s/>;]+)"#).unwrap());

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn first_capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

pub fn extract_title(html: &str) -> String {
    first_capture(&TITLE, html)
        .map(|t| truncate_chars(&t, MAX_TITLE_CHARS))
        .unwrap_or_default()
}

pub fn extract_description(html: &str) -> String {
    first_capture(&DESCRIPTION_NAME_FIRST, html)
        .or_else(|| first_capture(&DESCRIPTION_CONTENT_FIRST, html))
        .map(|d| truncate_chars(&d, MAX_DESCRIPTION_CHARS))
        .unwrap_or_default()
}

pub fn extract_charset(html: &str) -> String {
    first_capture(&CHARSET, html).unwrap_or_default()
}

fn header_str(headers: &HeaderMap, name: impl reqwest::header::AsHeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Combines markup-derived and header-derived metadata.
pub fn extract_metadata(html: &str, headers: &HeaderMap) -> Metadata {
    Metadata {
        title: extract_title(html),
        description: extract_description(html),
        charset: extract_charset(html),
        content_type: header_str(headers, CONTENT_TYPE),
        content_length: header_str(headers, CONTENT_LENGTH)
            .trim()
            .parse()
            .unwrap_or(0),
        server: header_str(headers, SERVER),
        powered_by: header_str(headers, "x-powered-by"),
        last_modified: header_str(headers, LAST_MODIFIED),
    }
}
