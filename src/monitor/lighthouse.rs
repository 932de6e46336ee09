//! Keyword-based page score estimates.
//!
//! These numbers only resemble Lighthouse categories. Each score starts
//! from a fixed baseline and moves by fixed amounts depending on crude
//! textual signals in the markup and headers, then is clamped to [0, 100].

use super::types::{LighthouseScores, Metadata, SecurityAssessment};
use reqwest::header::{HeaderMap, CACHE_CONTROL, CONTENT_ENCODING};

const PERFORMANCE_BASELINE: i32 = 85;
const ACCESSIBILITY_BASELINE: i32 = 80;
const BEST_PRACTICES_BASELINE: i32 = 75;
const SEO_BASELINE: i32 = 70;

const LARGE_PAGE_BYTES: usize = 100_000;
const SMALL_PAGE_BYTES: usize = 50_000;

fn clamp(score: i32) -> u8 {
    score.clamp(0, 100) as u8
}

fn bonus(condition: bool, points: i32) -> i32 {
    if condition {
        points
    } else {
        0
    }
}

pub fn estimate(
    html: &str,
    headers: &HeaderMap,
    metadata: &Metadata,
    security: &SecurityAssessment,
) -> LighthouseScores {
    let lower = html.to_ascii_lowercase();
    let has_h1 = lower.contains("<h1");

    let gzip = headers
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.to_ascii_lowercase().contains("gzip"));

    let mut performance = PERFORMANCE_BASELINE;
    if html.len() > LARGE_PAGE_BYTES {
        performance -= 10;
    } else if html.len() < SMALL_PAGE_BYTES {
        performance += 5;
    }
    performance += bonus(headers.contains_key(CACHE_CONTROL), 5);
    performance += bonus(gzip, 5);

    let accessibility = ACCESSIBILITY_BASELINE
        + bonus(lower.contains("alt="), 10)
        + bonus(lower.contains("aria-"), 5)
        + bonus(has_h1, 5);

    let best_practices = BEST_PRACTICES_BASELINE
        + bonus(security.https, 10)
        + bonus(security.hsts, 5)
        + bonus(security.csp, 5)
        + bonus(security.x_frame_options, 5);

    let seo = SEO_BASELINE
        + bonus(lower.contains("<title"), 10)
        + bonus(!metadata.description.is_empty(), 10)
        + bonus(lower.contains("og:"), 5)
        + bonus(has_h1, 5);

    LighthouseScores {
        performance: clamp(performance),
        accessibility: clamp(accessibility),
        best_practices: clamp(best_practices),
        seo: clamp(seo),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_baselines_for_bare_page() {
        // Large enough to skip the small-page bonus, small enough to avoid the penalty.
        let html = "x".repeat(60_000);
        let scores = estimate(
            &html,
            &HeaderMap::new(),
            &Metadata::default(),
            &SecurityAssessment::default(),
        );
        assert_eq!(
            scores,
            LighthouseScores {
                performance: 85,
                accessibility: 80,
                best_practices: 75,
                seo: 70,
            }
        );
    }

    #[test]
    fn test_rich_page_is_clamped() {
        let html = r#"<html><head><title>T</title><meta property="og:title" content="T"></head>
            <body><h1 aria-label="x">Hi</h1><img alt="y"></body></html>"#;
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=60"));
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        let metadata = Metadata {
            description: "d".to_string(),
            ..Metadata::default()
        };
        let security = SecurityAssessment {
            https: true,
            hsts: true,
            csp: true,
            x_frame_options: true,
            ..SecurityAssessment::default()
        };

        let scores = estimate(html, &headers, &metadata, &security);
        assert_eq!(scores.performance, 100);
        assert_eq!(scores.accessibility, 100);
        assert_eq!(scores.best_practices, 100);
        assert_eq!(scores.seo, 100);
    }

    #[test]
    fn test_large_page_penalty() {
        let html = "x".repeat(LARGE_PAGE_BYTES + 1);
        let scores = estimate(
            &html,
            &HeaderMap::new(),
            &Metadata::default(),
            &SecurityAssessment::default(),
        );
        assert_eq!(scores.performance, 75);
    }

    #[test]
    fn test_is_deterministic() {
        let html = "<title>A</title><h1>B</h1>";
        let a = estimate(html, &HeaderMap::new(), &Metadata::default(), &SecurityAssessment::default());
        let b = estimate(html, &HeaderMap::new(), &Metadata::default(), &SecurityAssessment::default());
        assert_eq!(a, b);
    }
}
