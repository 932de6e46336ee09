//! Shared utilities used across the SSL checker, proxy and monitor.
//!
//! Certificate parsing, timing, URL normalisation and status phrases are
//! needed by more than one of them and live here.

pub mod cert_parser;
pub mod grade;
pub mod status_text;
pub mod timing;
pub mod url;

pub use cert_parser::{parse_certificate, CertificateInfo, NegotiatedSession};
pub use grade::Grade;
pub use status_text::status_text;
pub use timing::DetailedTiming;
pub use url::normalize_url;
