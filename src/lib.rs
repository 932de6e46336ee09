pub mod config;
pub mod error;
pub mod infra;
pub mod monitor;
pub mod proxy;
pub mod routes;
pub mod shared;
pub mod ssl;

pub use config::Config;
pub use error::AppError;
pub use monitor::{check_website, MonitorResult};
pub use proxy::{execute_request, ProxyRequest, ProxyResponse};
pub use routes::{router, AppState};
pub use ssl::{check_certificate, SslCheckResult};
