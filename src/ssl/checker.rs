//! SSL/TLS certificate checker.
//!
//! Opens one TLS connection to the target, reads the leaf certificate and
//! the negotiated session parameters, then grades them. Trust problems are
//! findings, not failures: the handshake accepts any chain and reports
//! whether it would have been authorized.

use super::grading::{assess, GradeInputs};
use super::types::{CipherInfo, SslCheckResult};
use crate::infra::{connect_tls, resolve_socket_addr, InspectingTlsProvider, TrustVerdict};
use crate::shared::cert_parser::{negotiated_session, unix_now};
use crate::shared::{parse_certificate, NegotiatedSession};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream;

pub const DEFAULT_PORT: u16 = 443;

/// Ceiling for connect + handshake + certificate read.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound for sending `close_notify` once the check is done.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Reduces user input such as `https://example.com:8443/path` to the bare
/// host `example.com`.
pub fn normalize_domain(input: &str) -> String {
    let mut host = input.trim();

    if let Some(idx) = host.find("://") {
        host = &host[idx + 3..];
    }
    if let Some(idx) = host.find(&['/', '?', '#'][..]) {
        host = &host[..idx];
    }

    // A bare IPv6 literal has several colons and no brackets; leave it alone.
    let bare_ipv6 = !host.starts_with('[') && host.matches(':').count() > 1;
    if !bare_ipv6 {
        if let Some((head, port)) = host.rsplit_once(':') {
            if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) {
                host = head;
            }
        }
    }

    host.to_ascii_lowercase()
}

fn describe_deadline(deadline: Duration) -> String {
    if deadline.subsec_millis() == 0 {
        format!("{}s", deadline.as_secs())
    } else {
        format!("{}ms", deadline.as_millis())
    }
}

async fn handshake(
    provider: &InspectingTlsProvider,
    domain: &str,
    port: u16,
) -> Result<TlsStream<TcpStream>, String> {
    let addr = resolve_socket_addr(domain, port).await?;
    let tcp = TcpStream::connect(addr)
        .await
        .map_err(|e| format!("Connection failed: {}", e))?;
    connect_tls(provider, tcp, domain).await
}

/// Sends `close_notify` and drops the stream, which closes the socket.
async fn close(mut stream: TlsStream<TcpStream>) {
    if let Err(e) = timeout(SHUTDOWN_TIMEOUT, stream.shutdown()).await {
        tracing::debug!(error = %e, "TLS shutdown did not complete");
    }
}

/// Checks `domain:port` with the default ten second ceiling.
pub async fn check_certificate(domain: &str, port: u16) -> SslCheckResult {
    check_certificate_within(domain, port, CHECK_TIMEOUT).await
}

pub async fn check_certificate_within(
    domain: &str,
    port: u16,
    deadline: Duration,
) -> SslCheckResult {
    let provider = match InspectingTlsProvider::new() {
        Ok(p) => p,
        Err(e) => return SslCheckResult::failure(domain, port, e),
    };

    // Dropping the handshake future on timeout drops the socket with it.
    let stream = match timeout(deadline, handshake(&provider, domain, port)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            tracing::warn!(domain, port, error = %e, "SSL check failed");
            return SslCheckResult::failure(domain, port, e);
        }
        Err(_) => {
            tracing::warn!(domain, port, "SSL check timed out");
            return SslCheckResult::failure(
                domain,
                port,
                format!("Connection timeout ({})", describe_deadline(deadline)),
            );
        }
    };

    let session = negotiated_session(&stream);
    let result = analyze(domain, port, &session, provider.verdict(), unix_now());
    close(stream).await;

    if let Some(grade) = result.grade {
        tracing::debug!(domain, port, %grade, valid = ?result.valid, "SSL check finished");
    }
    result
}

/// Builds the result from an established session. `now` is Unix seconds.
pub fn analyze(
    domain: &str,
    port: u16,
    session: &NegotiatedSession,
    verdict: TrustVerdict,
    now: i64,
) -> SslCheckResult {
    let der = match session.leaf_der.as_deref() {
        Some(der) if !der.is_empty() => der,
        _ => return SslCheckResult::failure(domain, port, "No certificate found"),
    };

    let certificate = match parse_certificate(der, now) {
        Ok(info) => info,
        Err(e) => {
            return SslCheckResult::failure(
                domain,
                port,
                format!("Certificate analysis failed: {}", e),
            )
        }
    };

    let assessment = assess(&GradeInputs {
        days_until_expiry: certificate.days_until_expiry,
        protocol: &session.protocol,
        cipher: &session.cipher,
        key_size: certificate.key_size,
        san_count: certificate.subject_alt_names.len(),
    });

    SslCheckResult {
        success: true,
        domain: domain.to_string(),
        port,
        valid: Some(verdict.authorized && certificate.days_until_expiry > 0),
        authorized: Some(verdict.authorized),
        authorization_error: verdict.error,
        protocol: Some(session.protocol.clone()),
        cipher: Some(CipherInfo {
            name: session.cipher.clone(),
            version: session.protocol.clone(),
        }),
        certificate: Some(certificate),
        grade: Some(assessment.grade),
        warnings: assessment.warnings,
        recommendations: assessment.recommendations,
        error: None,
    }
}
