//! TLS/SSL infrastructure.
//!
//! Two client configurations are needed: the proxy behaves like a browser
//! and only talks to servers with a trusted chain, while the SSL checker must
//! be able to inspect any certificate and report trust as a finding.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::{DigitallySignedStruct, Error as RustlsError, RootCertStore, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use std::sync::{Arc, Mutex};
use tokio::net::TcpStream;
use tokio_rustls::{client::TlsStream, TlsConnector};

/// Installs the ring crypto provider as the process default.
///
/// Safe to call repeatedly; only the first call has an effect.
pub fn ensure_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

fn mozilla_roots() -> RootCertStore {
    RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned())
}

/// Source of client configurations for outbound TLS.
pub trait TlsProvider: Send + Sync {
    /// Returns the client configuration used for new connections.
    ///
    /// # Returns
    ///
    /// A shared `rustls::ClientConfig`.
    fn client_config(&self) -> Arc<rustls::ClientConfig>;

    /// Wraps `client_config` in a `TlsConnector`.
    fn connector(&self) -> TlsConnector {
        TlsConnector::from(self.client_config())
    }
}

/// Verifying provider backed by Mozilla's root certificates.
#[derive(Default)]
pub struct RustlsTlsProvider;

impl RustlsTlsProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TlsProvider for RustlsTlsProvider {
    fn client_config(&self) -> Arc<rustls::ClientConfig> {
        create_tls_config()
    }
}

/// Creates a verifying TLS client configuration (TLS 1.2 and 1.3).
///
/// # Returns
///
/// A shared client configuration trusting the Mozilla root store.
pub fn create_tls_config() -> Arc<rustls::ClientConfig> {
    ensure_crypto_provider();
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(mozilla_roots())
        .with_no_client_auth();

    Arc::new(config)
}

/// Outcome of the side-channel chain verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustVerdict {
    pub authorized: bool,
    pub error: Option<String>,
}

impl Default for TrustVerdict {
    fn default() -> Self {
        Self {
            authorized: false,
            error: Some("Certificate chain was not verified".to_string()),
        }
    }
}

/// Accepts every chain but records what the webpki verifier thought of it.
///
/// Handshake signatures go through the inner verifier too; a failure there
/// is recorded the same way so weak or mismatched keys can still be graded.
#[derive(Debug)]
struct RecordingVerifier {
    inner: Arc<WebPkiServerVerifier>,
    verdict: Arc<Mutex<Option<TrustVerdict>>>,
}

impl RecordingVerifier {
    fn new(verdict: Arc<Mutex<Option<TrustVerdict>>>) -> Result<Self, String> {
        let inner = WebPkiServerVerifier::builder(Arc::new(mozilla_roots()))
            .build()
            .map_err(|e| format!("Failed to build certificate verifier: {}", e))?;
        Ok(Self { inner, verdict })
    }

    /// A handshake signature the inner verifier rejects (for instance one
    /// made with an RSA key below ring's 2048-bit floor) marks the session
    /// unauthorized instead of aborting it.
    fn record_signature(
        &self,
        outcome: Result<HandshakeSignatureValid, RustlsError>,
    ) -> HandshakeSignatureValid {
        if let Err(e) = outcome {
            let note = format!("handshake signature not verified: {}", e);
            if let Ok(mut stored) = self.verdict.lock() {
                let error = match stored.take() {
                    Some(TrustVerdict {
                        error: Some(earlier),
                        ..
                    }) => format!("{}; {}", earlier, note),
                    _ => note,
                };
                *stored = Some(TrustVerdict {
                    authorized: false,
                    error: Some(error),
                });
            }
        }
        HandshakeSignatureValid::assertion()
    }
}

impl ServerCertVerifier for RecordingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, RustlsError> {
        let verdict = match self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        ) {
            Ok(_) => TrustVerdict {
                authorized: true,
                error: None,
            },
            Err(e) => TrustVerdict {
                authorized: false,
                error: Some(e.to_string()),
            },
        };

        if let Ok(mut stored) = self.verdict.lock() {
            *stored = Some(verdict);
        }
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        Ok(self.record_signature(self.inner.verify_tls12_signature(message, cert, dss)))
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        Ok(self.record_signature(self.inner.verify_tls13_signature(message, cert, dss)))
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Provider for certificate inspection. One instance per connection: the
/// recorded verdict belongs to the handshake made with its config.
pub struct InspectingTlsProvider {
    config: Arc<rustls::ClientConfig>,
    verdict: Arc<Mutex<Option<TrustVerdict>>>,
}

impl InspectingTlsProvider {
    /// Builds a provider with a fresh, empty verdict slot.
    ///
    /// # Returns
    ///
    /// A `Result` containing the provider on success, or an error message if
    /// the webpki verifier cannot be built.
    pub fn new() -> Result<Self, String> {
        ensure_crypto_provider();
        let verdict = Arc::new(Mutex::new(None));
        let verifier = RecordingVerifier::new(Arc::clone(&verdict))?;

        let config = rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(verifier))
            .with_no_client_auth();

        Ok(Self {
            config: Arc::new(config),
            verdict,
        })
    }

    /// The verdict recorded during the handshake.
    ///
    /// # Returns
    ///
    /// The recorded `TrustVerdict`, or an unauthorized default when no
    /// handshake reached certificate verification.
    pub fn verdict(&self) -> TrustVerdict {
        self.verdict
            .lock()
            .ok()
            .and_then(|v| v.clone())
            .unwrap_or_default()
    }
}

impl TlsProvider for InspectingTlsProvider {
    fn client_config(&self) -> Arc<rustls::ClientConfig> {
        Arc::clone(&self.config)
    }
}

/// Establishes a TLS connection over an existing TCP stream.
///
/// # Arguments
///
/// * `provider` - The TLS provider supplying the client configuration
/// * `tcp_stream` - The connected TCP stream to wrap
/// * `server_name` - The server name for SNI (brackets around IPv6 literals are stripped)
///
/// # Returns
///
/// A `Result` containing the TLS stream on success, or an error message on failure.
pub async fn connect_tls<P: TlsProvider + ?Sized>(
    provider: &P,
    tcp_stream: TcpStream,
    server_name: &str,
) -> Result<TlsStream<TcpStream>, String> {
    let connector = provider.connector();

    let host = server_name.trim_start_matches('[').trim_end_matches(']');
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| format!("Invalid server name: {}", e))?;

    connector
        .connect(server_name, tcp_stream)
        .await
        .map_err(|e| format!("TLS handshake failed: {}", e))
}
