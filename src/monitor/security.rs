//! Security header assessment.

use super::types::SecurityAssessment;
use crate::shared::Grade;
use reqwest::header::{
    HeaderMap, CONTENT_SECURITY_POLICY, STRICT_TRANSPORT_SECURITY, X_FRAME_OPTIONS,
    X_XSS_PROTECTION,
};

pub const HTTPS_POINTS: u32 = 30;
pub const HSTS_POINTS: u32 = 20;
pub const CSP_POINTS: u32 = 25;
pub const X_FRAME_POINTS: u32 = 15;
pub const XSS_POINTS: u32 = 10;

/// Maps a 0-100 score to a letter grade.
pub fn grade_for(score: u32) -> Grade {
    match score {
        90.. => Grade::APlus,
        80..=89 => Grade::A,
        70..=79 => Grade::B,
        60..=69 => Grade::C,
        50..=59 => Grade::D,
        _ => Grade::F,
    }
}

/// Weighted total of the present security features.
pub fn score(https: bool, hsts: bool, csp: bool, x_frame: bool, xss: bool) -> u32 {
    [
        (https, HTTPS_POINTS),
        (hsts, HSTS_POINTS),
        (csp, CSP_POINTS),
        (x_frame, X_FRAME_POINTS),
        (xss, XSS_POINTS),
    ]
    .iter()
    .filter(|(present, _)| *present)
    .map(|(_, points)| points)
    .sum()
}

/// Assesses a response; `url` is the URL that was requested.
pub fn assess(url: &str, headers: &HeaderMap) -> SecurityAssessment {
    let https = url.starts_with("https");
    let hsts = headers.contains_key(STRICT_TRANSPORT_SECURITY);
    let csp = headers.contains_key(CONTENT_SECURITY_POLICY);
    let x_frame_options = headers.contains_key(X_FRAME_OPTIONS);
    let xss_protection = headers.contains_key(X_XSS_PROTECTION);

    let score = score(https, hsts, csp, x_frame_options, xss_protection);

    SecurityAssessment {
        https,
        hsts,
        csp,
        x_frame_options,
        xss_protection,
        score,
        grade: grade_for(score),
    }
}
