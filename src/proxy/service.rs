//! Proxy service abstraction layer.
//!
//! Routes hold an `Arc<dyn ProxyService>` so the outbound side can be
//! replaced in tests without touching the network.

use super::executor::execute_request;
use super::types::{ProxyRequest, ProxyResponse};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Outbound side of the proxy endpoint.
pub trait ProxyService: Send + Sync {
    /// Executes a validated proxy request.
    ///
    /// # Arguments
    ///
    /// * `request` - The validated request; the target has already passed the blocklist
    ///
    /// # Returns
    ///
    /// A future resolving to the `ProxyResponse`. Network failures are reported
    /// inside it with `success: false`, never as an error.
    fn execute(
        &self,
        request: ProxyRequest,
    ) -> Pin<Box<dyn Future<Output = ProxyResponse> + Send + '_>>;
}

/// Default service: performs the request over the network.
#[derive(Default, Clone)]
pub struct HttpProxyService;

impl HttpProxyService {
    /// Creates a new service.
    pub fn new() -> Self {
        Self
    }

    /// Creates a new service behind an `Arc`, ready for `AppState`.
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl ProxyService for HttpProxyService {
    fn execute(
        &self,
        request: ProxyRequest,
    ) -> Pin<Box<dyn Future<Output = ProxyResponse> + Send + '_>> {
        Box::pin(async move { execute_request(request).await })
    }
}
