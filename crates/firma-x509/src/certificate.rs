#![forbid(unsafe_code)]

//! Certificate extraction and temporal classification.

use base64::Engine;
use chrono::{DateTime, Utc};
use const_oid::db::rfc4519::CN;
use der::Decode;
use firma_core::Error;
use serde::{Deserialize, Serialize};
use x509_cert::name::Name;
use x509_cert::time::Time;
use x509_cert::Certificate;

/// Summary of the signer certificate reported with every verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub issuer: Option<String>,
    pub subject: Option<String>,
    /// Serial number as a decimal string.
    pub serial: Option<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    /// Whether the evaluation time fell outside the validity window.
    pub is_expired: bool,
}

/// Where an instant falls relative to a certificate's validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalValidity {
    Valid,
    NotYetValid,
    Expired,
}

impl TemporalValidity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Decode a base64 DER certificate, ignoring embedded whitespace.
pub fn decode_certificate(b64: &str) -> Result<Certificate, Error> {
    let cleaned: String = b64.chars().filter(|c| !c.is_whitespace()).collect();
    let der = base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| Error::Base64(e.to_string()))?;
    Certificate::from_der(&der).map_err(|e| Error::Certificate(e.to_string()))
}

/// Extract issuer, subject, serial and validity from `cert`.
///
/// Never fails. When the validity window cannot be read the whole summary
/// falls back to `CertificateInfo::default()`.
pub fn extract_certificate_info(cert: &Certificate, now: DateTime<Utc>) -> CertificateInfo {
    match try_extract(cert, now) {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!(error = %e, "certificate details could not be extracted");
            CertificateInfo::default()
        }
    }
}

fn try_extract(cert: &Certificate, now: DateTime<Utc>) -> Result<CertificateInfo, Error> {
    let tbs = &cert.tbs_certificate;
    Ok(CertificateInfo {
        issuer: Some(common_name_or_dn(&tbs.issuer)),
        subject: Some(common_name_or_dn(&tbs.subject)),
        serial: Some(serial_decimal(tbs.serial_number.as_bytes())),
        valid_from: Some(to_datetime(&tbs.validity.not_before)?),
        valid_to: Some(to_datetime(&tbs.validity.not_after)?),
        is_expired: !check_validity(cert, now).is_valid(),
    })
}

/// Decimal form of a DER INTEGER serial. Old certificates carry negative ones.
fn serial_decimal(content: &[u8]) -> String {
    num_bigint_dig::BigInt::from_signed_bytes_be(content).to_string()
}

fn common_name_or_dn(name: &Name) -> String {
    crate::name::first_attribute(name, CN).unwrap_or_else(|| name.to_string())
}

fn to_datetime(time: &Time) -> Result<DateTime<Utc>, Error> {
    let secs = i64::try_from(time.to_unix_duration().as_secs())
        .map_err(|_| Error::Certificate("validity date out of range".into()))?;
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| Error::Certificate("validity date out of range".into()))
}

/// Classify `now` against the certificate's not-before / not-after bounds.
/// Both bounds are inclusive.
pub fn check_validity(cert: &Certificate, now: DateTime<Utc>) -> TemporalValidity {
    let validity = &cert.tbs_certificate.validity;
    let now = now.timestamp();
    let secs = |t: &Time| i64::try_from(t.to_unix_duration().as_secs()).unwrap_or(i64::MAX);
    if secs(&validity.not_before) > now {
        TemporalValidity::NotYetValid
    } else if secs(&validity.not_after) < now {
        TemporalValidity::Expired
    } else {
        TemporalValidity::Valid
    }
}
