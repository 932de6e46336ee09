//! SSL/TLS certificate checker.

pub mod grading;
pub mod checker;
pub mod types;

pub use grading::{assess, Assessment, GradeInputs};
pub use checker::{check_certificate, check_certificate_within, normalize_domain, DEFAULT_PORT};
pub use crate::shared::Grade;
pub use types::{CipherInfo, SslCheckRequest, SslCheckResult};
