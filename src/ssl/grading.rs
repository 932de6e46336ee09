//! Heuristic certificate/session grading.
//!
//! The grade starts at `A` and can only be lowered. Recommendations are
//! collected independently of the grade.

use crate::shared::Grade;

/// Keys below this size cap the grade at `C`.
pub const MIN_KEY_BITS: u32 = 2048;
/// Certificates expiring sooner than this cap the grade at `B`.
pub const EXPIRY_WARNING_DAYS: i64 = 30;
/// Certificates expiring sooner than this get a renewal recommendation.
pub const RENEWAL_RECOMMENDATION_DAYS: i64 = 90;

/// Everything the grader looks at.
#[derive(Debug, Clone)]
pub struct GradeInputs<'a> {
    pub days_until_expiry: i64,
    pub protocol: &'a str,
    pub cipher: &'a str,
    pub key_size: Option<u32>,
    pub san_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub grade: Grade,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

pub fn assess(inputs: &GradeInputs<'_>) -> Assessment {
    let mut grade = Grade::A;
    let mut warnings = Vec::new();
    let mut recommendations = Vec::new();

    let days = inputs.days_until_expiry;
    if days < 0 {
        grade.cap(Grade::F);
        warnings.push("Certificate has expired".to_string());
    } else if days < EXPIRY_WARNING_DAYS {
        grade.cap(Grade::B);
        warnings.push(format!("Certificate expires in {} days", days));
    }

    if inputs.protocol.contains("TLSv1.0") {
        grade.cap(Grade::C);
        warnings.push(format!("Outdated protocol {}", inputs.protocol));
    } else if inputs.protocol.contains("TLSv1.1") {
        grade.cap(Grade::B);
        warnings.push(format!("Outdated protocol {}", inputs.protocol));
    }

    let cipher = inputs.cipher.to_ascii_uppercase();
    if cipher.contains("RC4") || cipher.contains("DES") {
        grade.cap(Grade::F);
        warnings.push(format!("Weak cipher: {}", inputs.cipher));
    }

    if let Some(bits) = inputs.key_size {
        if bits < MIN_KEY_BITS {
            grade.cap(Grade::C);
            warnings.push(format!("Weak key size: {} bits", bits));
        }
    }

    if days < RENEWAL_RECOMMENDATION_DAYS {
        recommendations.push(format!(
            "Renew the certificate soon (expires in {} days)",
            days
        ));
    }
    if !inputs.protocol.contains("TLSv1.3") {
        recommendations.push("Upgrade the server to TLS 1.3".to_string());
    }
    if inputs.san_count == 0 {
        recommendations.push("Add Subject Alternative Name (SAN) entries".to_string());
    }

    Assessment {
        grade,
        warnings,
        recommendations,
    }
}
