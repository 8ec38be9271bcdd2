#![forbid(unsafe_code)]

//! OCSP responder discovery and the pluggable revocation backend.
//!
//! Discovery reads the Authority Information Access extension. Without an
//! [`OcspClient`] no request is made and the status stays unknown.

use const_oid::{AssociatedOid, ObjectIdentifier};
use der::Decode;
use firma_core::Error;
use std::time::Duration;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::AuthorityInfoAccessSyntax;
use x509_cert::Certificate;

/// id-ad-ocsp access method (1.3.6.1.5.5.7.48.1).
const OCSP_ACCESS_METHOD: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1");

/// Revocation outcome: `revoked` is unknown when nobody answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevocationStatus {
    pub revoked: Option<bool>,
    pub checked: bool,
}

impl RevocationStatus {
    pub fn not_checked() -> Self {
        Self::default()
    }
}

/// Answer from an OCSP responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcspStatus {
    Good,
    Revoked,
    Unknown,
}

/// A revocation backend able to query an OCSP responder.
///
/// Implementations own the network request and must give up after `timeout`,
/// returning an error.
pub trait OcspClient: Send + Sync {
    fn status(
        &self,
        responder_url: &str,
        cert: &Certificate,
        timeout: Duration,
    ) -> Result<OcspStatus, Error>;
}

/// OCSP responder URLs listed in the certificate's AIA extension.
pub fn ocsp_responder_urls(cert: &Certificate) -> Result<Vec<String>, Error> {
    let mut urls = Vec::new();
    let Some(extensions) = &cert.tbs_certificate.extensions else {
        return Ok(urls);
    };
    for ext in extensions
        .iter()
        .filter(|e| e.extn_id == AuthorityInfoAccessSyntax::OID)
    {
        let aia = AuthorityInfoAccessSyntax::from_der(ext.extn_value.as_bytes())
            .map_err(|e| Error::Revocation(format!("AuthorityInfoAccess: {e}")))?;
        for ad in aia.0.iter() {
            if ad.access_method == OCSP_ACCESS_METHOD {
                if let GeneralName::UniformResourceIdentifier(uri) = &ad.access_location {
                    urls.push(uri.to_string());
                }
            }
        }
    }
    Ok(urls)
}

/// Determine the revocation state of `cert`.
///
/// No responder URL, or no client, is the common case and yields
/// [`RevocationStatus::not_checked`]. With a client the responders are tried
/// in order until one answers. If every responder fails the last error is
/// returned.
pub fn check_revocation(
    cert: &Certificate,
    client: Option<&dyn OcspClient>,
    timeout: Duration,
) -> Result<RevocationStatus, Error> {
    let urls = ocsp_responder_urls(cert)?;
    let Some(client) = client else {
        if !urls.is_empty() {
            tracing::debug!(responders = ?urls, "OCSP responders found, no client configured");
        }
        return Ok(RevocationStatus::not_checked());
    };

    let mut last_err = None;
    for url in &urls {
        match client.status(url, cert, timeout) {
            Ok(status) => {
                tracing::debug!(responder = %url, ?status, "OCSP answer");
                return Ok(match status {
                    OcspStatus::Good => RevocationStatus {
                        revoked: Some(false),
                        checked: true,
                    },
                    OcspStatus::Revoked => RevocationStatus {
                        revoked: Some(true),
                        checked: true,
                    },
                    OcspStatus::Unknown => RevocationStatus {
                        revoked: None,
                        checked: true,
                    },
                });
            }
            Err(e) => {
                tracing::warn!(responder = %url, error = %e, "OCSP query failed");
                last_err = Some(e);
            }
        }
    }
    match last_err {
        Some(e) => Err(e),
        None => Ok(RevocationStatus::not_checked()),
    }
}
