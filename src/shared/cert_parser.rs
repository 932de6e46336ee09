//! X.509 certificate parsing utilities.
//!
//! Turns the DER-encoded leaf certificate of a TLS session into the
//! serialisable `CertificateInfo` reported by the SSL checker and the proxy.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio::net::TcpStream;
use x509_parser::objects::{oid2abbrev, oid2sn, oid_registry};
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

const SECONDS_PER_DAY: i64 = 86_400;

/// Certificate fields reported to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateInfo {
    pub subject: BTreeMap<String, String>,
    pub issuer: BTreeMap<String, String>,
    pub valid_from: String,
    pub valid_to: String,
    pub days_until_expiry: i64,
    /// SHA-1 over the DER encoding, colon separated upper-case hex.
    pub fingerprint: String,
    pub fingerprint256: String,
    pub serial_number: String,
    pub key_algorithm: String,
    pub key_size: Option<u32>,
    pub signature_algorithm: String,
    pub subject_alt_names: Vec<String>,
}

impl CertificateInfo {
    pub fn common_name(&self) -> Option<&str> {
        self.subject.get("CN").map(String::as_str)
    }

    pub fn issuer_common_name(&self) -> Option<&str> {
        self.issuer.get("CN").map(String::as_str)
    }
}

/// What the TLS handshake negotiated, plus the raw leaf certificate.
#[derive(Debug, Clone)]
pub struct NegotiatedSession {
    pub protocol: String,
    pub cipher: String,
    pub leaf_der: Option<Vec<u8>>,
}

/// Whole days from `now` until `valid_to`, rounded towards negative infinity.
pub fn days_until(valid_to: i64, now: i64) -> i64 {
    (valid_to - now).div_euclid(SECONDS_PER_DAY)
}

/// Current Unix time in seconds.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

fn rfc3339(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

fn name_map(name: &X509Name) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for attr in name.iter_attributes() {
        let Ok(value) = attr.as_str() else {
            continue;
        };
        let key = oid2abbrev(attr.attr_type(), oid_registry())
            .map(str::to_string)
            .unwrap_or_else(|_| attr.attr_type().to_id_string());

        map.entry(key)
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    map
}

/// Number of significant bits in a big-endian unsigned integer.
fn bit_length(bytes: &[u8]) -> u32 {
    let trimmed: &[u8] = match bytes.iter().position(|b| *b != 0) {
        Some(idx) => &bytes[idx..],
        None => return 0,
    };
    (trimmed.len() as u32 - 1) * 8 + (8 - trimmed[0].leading_zeros())
}

/// Field size of an EC public point (`04 || X || Y` or `02|03 || X`).
fn ec_point_bits(point: &[u8]) -> u32 {
    match point.first() {
        Some(0x04) => ((point.len() as u32 - 1) / 2) * 8,
        Some(0x02) | Some(0x03) => (point.len() as u32 - 1) * 8,
        _ => 0,
    }
}

fn public_key_info(cert: &X509Certificate) -> (String, Option<u32>) {
    let spki = cert.public_key();
    match spki.parsed() {
        Ok(PublicKey::RSA(rsa)) => ("RSA".to_string(), Some(bit_length(rsa.modulus))),
        Ok(PublicKey::EC(ec)) => ("EC".to_string(), Some(ec_point_bits(ec.data()))),
        Ok(PublicKey::DSA(y)) => ("DSA".to_string(), Some(bit_length(y))),
        _ => {
            let oid = &spki.algorithm.algorithm;
            let name = oid2sn(oid, oid_registry())
                .map(str::to_string)
                .unwrap_or_else(|_| oid.to_id_string());
            (name, None)
        }
    }
}

fn subject_alt_names(cert: &X509Certificate) -> Vec<String> {
    let mut sans = Vec::new();

    if let Ok(Some(san_ext)) = cert.subject_alternative_name() {
        for name in &san_ext.value.general_names {
            match name {
                GeneralName::DNSName(dns) => sans.push(dns.to_string()),
                GeneralName::IPAddress(ip) => {
                    if let Ok(octets) = <[u8; 4]>::try_from(*ip) {
                        sans.push(Ipv4Addr::from(octets).to_string());
                    } else if let Ok(octets) = <[u8; 16]>::try_from(*ip) {
                        sans.push(Ipv6Addr::from(octets).to_string());
                    }
                }
                _ => {}
            }
        }
    }

    sans
}

/// Parses a DER-encoded certificate.
///
/// # Arguments
///
/// * `der` - The DER-encoded certificate
/// * `now` - The current time in Unix seconds, used for `days_until_expiry`
///
/// # Returns
///
/// A `Result` containing the `CertificateInfo` on success, or an error message
/// if the certificate cannot be parsed.
pub fn parse_certificate(der: &[u8], now: i64) -> Result<CertificateInfo, String> {
    let (_, cert) = X509Certificate::from_der(der).map_err(|e| e.to_string())?;

    let valid_from = cert.validity().not_before.timestamp();
    let valid_to = cert.validity().not_after.timestamp();

    let sig_oid = &cert.signature_algorithm.algorithm;
    let signature_algorithm = oid2sn(sig_oid, oid_registry())
        .map(str::to_string)
        .unwrap_or_else(|_| sig_oid.to_id_string());

    let (key_algorithm, key_size) = public_key_info(&cert);

    let serial_number = cert
        .raw_serial()
        .iter()
        .skip_while(|b| **b == 0)
        .map(|b| format!("{:02X}", b))
        .collect::<String>();

    Ok(CertificateInfo {
        subject: name_map(cert.subject()),
        issuer: name_map(cert.issuer()),
        valid_from: rfc3339(valid_from),
        valid_to: rfc3339(valid_to),
        days_until_expiry: days_until(valid_to, now),
        fingerprint: colon_hex(&Sha1::digest(der)),
        fingerprint256: colon_hex(&Sha256::digest(der)),
        serial_number,
        key_algorithm,
        key_size,
        signature_algorithm,
        subject_alt_names: subject_alt_names(&cert),
    })
}

/// Formats a negotiated protocol version the way browsers and Node report it.
pub fn protocol_name(version: Option<rustls::ProtocolVersion>) -> String {
    match version {
        Some(rustls::ProtocolVersion::SSLv3) => "SSLv3".to_string(),
        Some(rustls::ProtocolVersion::TLSv1_0) => "TLSv1.0".to_string(),
        Some(rustls::ProtocolVersion::TLSv1_1) => "TLSv1.1".to_string(),
        Some(rustls::ProtocolVersion::TLSv1_2) => "TLSv1.2".to_string(),
        Some(rustls::ProtocolVersion::TLSv1_3) => "TLSv1.3".to_string(),
        Some(other) => format!("{:?}", other),
        None => "unknown".to_string(),
    }
}

/// Extracts protocol, cipher and the leaf certificate from a TLS connection.
pub fn negotiated_session(
    conn: &tokio_rustls::client::TlsStream<TcpStream>,
) -> NegotiatedSession {
    let (_, client_conn) = conn.get_ref();

    let cipher = client_conn
        .negotiated_cipher_suite()
        .map(|cs| format!("{:?}", cs.suite()))
        .unwrap_or_else(|| "unknown".to_string());

    let leaf_der = client_conn
        .peer_certificates()
        .and_then(|certs| certs.first())
        .map(|cert| cert.as_ref().to_vec());

    NegotiatedSession {
        protocol: protocol_name(client_conn.protocol_version()),
        cipher,
        leaf_der,
    }
}
