mod support;

use devtools_hub::infra::ensure_crypto_provider;
use devtools_hub::ssl::{check_certificate_within, Grade};
use rustls::crypto::ring::sign::any_supported_type;
use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;
use rustls_pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use support::spawn_silent_server;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

/// Accept TLS connections with `config` and drain whatever the client sends.
async fn serve_tls(config: rustls::ServerConfig) -> SocketAddr {
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(mut stream) = acceptor.accept(socket).await {
                    let mut buf = [0u8; 256];
                    while let Ok(n) = stream.read(&mut buf).await {
                        if n == 0 {
                            break;
                        }
                    }
                }
            });
        }
    });

    addr
}

/// TLS server presenting a self-signed certificate valid between the given
/// years.
async fn spawn_tls_server(not_before_year: i32, not_after_year: i32) -> SocketAddr {
    ensure_crypto_provider();

    let mut params = rcgen::CertificateParams::new(vec!["localhost".to_string()]).unwrap();
    params.not_before = rcgen::date_time_ymd(not_before_year, 1, 1);
    params.not_after = rcgen::date_time_ymd(not_after_year, 1, 1);
    let key = rcgen::KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();

    let chain: Vec<CertificateDer<'static>> = vec![cert.der().clone()];
    let private_key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der()));
    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(chain, private_key)
        .unwrap();

    serve_tls(config).await
}

/// Always hands out the same certificate and signing key, whether or not
/// they belong together.
#[derive(Debug)]
struct FixedCertificate(Arc<CertifiedKey>);

impl ResolvesServerCert for FixedCertificate {
    fn resolve(&self, _client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        Some(Arc::clone(&self.0))
    }
}

/// TLS server presenting a 1024-bit RSA certificate.
///
/// ring refuses to sign with RSA keys this small, so the handshake is signed
/// with an unrelated P-256 key and the client sees a bad signature.
async fn spawn_weak_rsa_server() -> SocketAddr {
    ensure_crypto_provider();

    let leaf = CertificateDer::from(include_bytes!("fixtures/weak_rsa_1024.der").to_vec());
    let signer = rcgen::KeyPair::generate().unwrap();
    let signing_key = any_supported_type(&PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
        signer.serialize_der(),
    )))
    .unwrap();
    let certified = Arc::new(CertifiedKey::new(vec![leaf], signing_key));

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_cert_resolver(Arc::new(FixedCertificate(certified)));

    serve_tls(config).await
}

#[tokio::test]
async fn test_expired_certificate_grades_f() {
    let addr = spawn_tls_server(2019, 2021).await;

    let result = check_certificate_within("127.0.0.1", addr.port(), Duration::from_secs(5)).await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.valid, Some(false));
    assert_eq!(result.authorized, Some(false));
    assert!(result.authorization_error.is_some());
    assert_eq!(result.grade, Some(Grade::F));
    assert_eq!(result.protocol.as_deref(), Some("TLSv1.3"));

    let certificate = result.certificate.unwrap();
    assert!(certificate.days_until_expiry < 0);
    assert_eq!(certificate.subject_alt_names, vec!["localhost".to_string()]);
    assert!(result.warnings.iter().any(|w| w.contains("expired")));
}

#[tokio::test]
async fn test_untrusted_but_current_certificate() {
    let addr = spawn_tls_server(2020, 2090).await;

    let result = check_certificate_within("127.0.0.1", addr.port(), Duration::from_secs(5)).await;
    assert!(result.success, "{:?}", result.error);
    // Self-signed: never authorized, so never valid. The P-256 key is the
    // only thing holding the grade down.
    assert_eq!(result.authorized, Some(false));
    assert_eq!(result.valid, Some(false));
    assert_eq!(result.grade, Some(Grade::C));
    assert_eq!(result.warnings, vec!["Weak key size: 256 bits".to_string()]);
    assert!(result.certificate.unwrap().days_until_expiry > 90);
}

#[tokio::test]
async fn test_weak_rsa_key_grades_c() {
    let addr = spawn_weak_rsa_server().await;

    let result = check_certificate_within("127.0.0.1", addr.port(), Duration::from_secs(5)).await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.grade, Some(Grade::C));
    assert!(result
        .warnings
        .contains(&"Weak key size: 1024 bits".to_string()));
    assert_eq!(result.authorized, Some(false));
    assert!(result
        .authorization_error
        .as_deref()
        .unwrap()
        .contains("handshake signature not verified"));

    let certificate = result.certificate.unwrap();
    assert_eq!(certificate.key_algorithm, "RSA");
    assert_eq!(certificate.key_size, Some(1024));
    assert_eq!(certificate.subject_alt_names, vec!["weak.test".to_string()]);
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let addr = spawn_silent_server().await;

    let result =
        check_certificate_within("127.0.0.1", addr.port(), Duration::from_millis(200)).await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Connection timeout (200ms)"));
    assert!(result.grade.is_none());
}
