use crate::shared::{CertificateInfo, Grade};
use serde::{Deserialize, Serialize};

/// Incoming SSL check request.
#[derive(Debug, Default, Deserialize)]
pub struct SslCheckRequest {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CipherInfo {
    pub name: String,
    pub version: String,
}

/// SSL check response.
///
/// A failed check carries only `success`, `domain`, `port` and `error`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SslCheckResult {
    pub success: bool,
    pub domain: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cipher: Option<CipherInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<Grade>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SslCheckResult {
    pub fn failure(domain: &str, port: u16, error: impl Into<String>) -> Self {
        Self {
            success: false,
            domain: domain.to_string(),
            port,
            valid: None,
            authorized: None,
            authorization_error: None,
            protocol: None,
            cipher: None,
            certificate: None,
            grade: None,
            warnings: Vec::new(),
            recommendations: Vec::new(),
            error: Some(error.into()),
        }
    }
}
