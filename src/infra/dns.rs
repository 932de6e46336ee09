//! DNS resolution infrastructure.
//!
//! Targets are resolved through hickory so the lookup is measured on
//! its own and IP literals skip the resolver entirely.

use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    system_conf::read_system_conf,
    TokioAsyncResolver,
};
use std::net::{IpAddr, SocketAddr};

#[allow(async_fn_in_trait)]
pub trait DnsResolver: Send + Sync {
    /// Resolves a hostname (or IP literal) to at least one address.
    ///
    /// # Arguments
    ///
    /// * `host` - The hostname or IP literal to resolve
    ///
    /// # Returns
    ///
    /// A `Result` containing the resolved addresses on success, or an error
    /// message on failure.
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, String>;
}

/// Resolver settings for a single lookup.
///
/// Nameservers and options come from the host (`/etc/resolv.conf` on Unix),
/// falling back to hickory's defaults when that cannot be read. Answers are
/// never cached so every lookup reaches a nameserver and shows up in timing.
pub fn resolver_settings() -> (ResolverConfig, ResolverOpts) {
    let (config, mut opts) = match read_system_conf() {
        Ok(conf) => conf,
        Err(e) => {
            tracing::debug!(error = %e, "system resolver configuration unavailable");
            (ResolverConfig::default(), ResolverOpts::default())
        }
    };
    opts.cache_size = 0;
    (config, opts)
}

/// Parses `host` as an IP literal, accepting the bracketed IPv6 form that
/// `Url::host_str` produces.
pub fn parse_ip_literal(host: &str) -> Option<IpAddr> {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .ok()
}

#[derive(Default)]
pub struct HickoryDnsResolver;

impl HickoryDnsResolver {
    pub fn new() -> Self {
        Self
    }
}

impl DnsResolver for HickoryDnsResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, String> {
        if let Some(ip) = parse_ip_literal(host) {
            return Ok(vec![ip]);
        }

        let (config, opts) = resolver_settings();
        let resolver = TokioAsyncResolver::tokio(config, opts);
        match resolver.lookup_ip(host).await {
            Ok(response) => {
                let ips: Vec<IpAddr> = response.iter().collect();
                if ips.is_empty() {
                    Err(format!("DNS lookup for {} returned no addresses", host))
                } else {
                    Ok(ips)
                }
            }
            Err(e) => Err(format!("DNS lookup failed for {}: {}", host, e)),
        }
    }
}

/// Resolves `host` with a fresh resolver built from system configuration.
///
/// # Arguments
///
/// * `host` - The hostname or IP literal to resolve
///
/// # Returns
///
/// A `Result` containing the resolved addresses on success, or an error
/// message on failure.
pub async fn resolve_dns(host: &str) -> Result<Vec<IpAddr>, String> {
    HickoryDnsResolver::new().resolve(host).await
}

/// Resolves `host` and pairs the first address with `port`.
///
/// # Arguments
///
/// * `host` - The hostname or IP literal to connect to
/// * `port` - The TCP port of the target
///
/// # Returns
///
/// A `Result` containing the socket address to dial on success, or an error
/// message on failure.
pub async fn resolve_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let ips = resolve_dns(host).await?;
    Ok(SocketAddr::new(ips[0], port))
}
