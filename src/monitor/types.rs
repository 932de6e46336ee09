use crate::shared::Grade;
use serde::{Deserialize, Serialize};

/// Incoming website monitor request.
#[derive(Debug, Default, Deserialize)]
pub struct MonitorRequest {
    #[serde(default)]
    pub url: Option<String>,
    /// Timeout in milliseconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    /// A final response with a 1xx-3xx status.
    Online,
    /// A final response with a 4xx/5xx status.
    Degraded,
    /// No response at all.
    Offline,
}

/// Page metadata. Missing values are empty strings / zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub charset: String,
    pub content_type: String,
    pub content_length: u64,
    pub server: String,
    pub powered_by: String,
    pub last_modified: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAssessment {
    pub https: bool,
    pub hsts: bool,
    pub csp: bool,
    pub x_frame_options: bool,
    pub xss_protection: bool,
    pub score: u32,
    pub grade: Grade,
}

impl Default for SecurityAssessment {
    fn default() -> Self {
        Self {
            https: false,
            hsts: false,
            csp: false,
            x_frame_options: false,
            xss_protection: false,
            score: 0,
            grade: Grade::F,
        }
    }
}

/// Estimated phase breakdown of one wall-clock measurement, in ms.
///
/// Only `total` is measured; the phases are fixed shares of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PerformanceMetrics {
    pub dns: u64,
    pub connect: u64,
    pub ssl: u64,
    pub ttfb: u64,
    pub download: u64,
    pub total: u64,
}

/// Heuristic page scores in [0, 100]. These are keyword-based estimates,
/// not the result of a Lighthouse audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LighthouseScores {
    pub performance: u8,
    pub accessibility: u8,
    pub best_practices: u8,
    pub seo: u8,
}

/// Website monitor response. Every field is always present so clients can
/// render failures with the same layout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorResult {
    pub success: bool,
    pub url: String,
    pub status: SiteStatus,
    pub status_code: u16,
    pub status_text: String,
    pub response_time: u64,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: Metadata,
    pub security: SecurityAssessment,
    pub performance: PerformanceMetrics,
    pub lighthouse: LighthouseScores,
}

impl MonitorResult {
    /// Zeroed result for a site that could not be reached (or checked).
    pub fn offline(url: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            url: url.to_string(),
            status: SiteStatus::Offline,
            status_code: 0,
            status_text: String::new(),
            response_time: 0,
            timestamp: chrono::Utc::now().to_rfc3339(),
            error: Some(error.into()),
            metadata: Metadata::default(),
            security: SecurityAssessment::default(),
            performance: PerformanceMetrics::default(),
            lighthouse: LighthouseScores::default(),
        }
    }
}
