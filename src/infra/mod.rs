//! Infrastructure layer providing abstractions for external dependencies.
//!
//! This module contains traits and implementations for:
//! - DNS resolution
//! - TLS/SSL connections (verifying and inspecting)
//! - Content decompression

pub mod decompressor;
pub mod dns;
pub mod tls;

pub use decompressor::{decompress_body, Decompressor, MultiDecompressor};
pub use dns::{resolve_dns, resolve_socket_addr, DnsResolver, HickoryDnsResolver};
pub use tls::{
    connect_tls, create_tls_config, ensure_crypto_provider, InspectingTlsProvider,
    RustlsTlsProvider, TlsProvider, TrustVerdict,
};
