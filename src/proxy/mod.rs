pub mod executor;
pub mod policy;
pub mod response_builder;
pub mod service;
pub mod types;

pub use executor::{execute_request, outbound_headers, HOP_BY_HOP_HEADERS};
pub use policy::{check_target, is_blocked_host, BLOCKED_MESSAGE};
pub use response_builder::{build_response, flatten_headers, Exchange};
pub use service::{HttpProxyService, ProxyService};
pub use types::*;
