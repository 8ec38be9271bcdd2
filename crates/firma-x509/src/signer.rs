#![forbid(unsafe_code)]

//! Human-identifying details of the signer.

use const_oid::db::rfc4519::{CN, O, SERIAL_NUMBER};
use const_oid::AssociatedOid;
use der::Decode;
use firma_core::Error;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::Certificate;

/// Spanish NIF/CIF shapes: one or two letters or digits, seven or eight
/// digits, an optional control letter. A heuristic only; other national
/// formats will not match and the raw attribute is reported instead.
static TAX_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z0-9]{1,2}\d{7,8}[A-Z]?").expect("valid tax id pattern"));

/// Signer identity. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInfo {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub organization: Option<String>,
    pub email: Option<String>,
}

/// Extract the signer's name, organization, tax id and email.
///
/// Never fails. A damaged SubjectAltName degrades the whole result to
/// `SignerInfo::default()`.
pub fn extract_signer_info(cert: &Certificate) -> SignerInfo {
    match try_extract(cert) {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!(error = %e, "signer details could not be extracted");
            SignerInfo::default()
        }
    }
}

fn try_extract(cert: &Certificate) -> Result<SignerInfo, Error> {
    let subject = &cert.tbs_certificate.subject;
    Ok(SignerInfo {
        name: crate::name::first_attribute(subject, CN),
        tax_id: crate::name::first_attribute(subject, SERIAL_NUMBER).map(|sn| tax_id_from(&sn)),
        organization: crate::name::first_attribute(subject, O),
        email: san_email(cert)?,
    })
}

/// The NIF/CIF embedded in a subject serialNumber, or the raw value.
pub fn tax_id_from(serial_number: &str) -> String {
    TAX_ID
        .find(serial_number)
        .map_or_else(|| serial_number.to_owned(), |m| m.as_str().to_owned())
}

fn san_email(cert: &Certificate) -> Result<Option<String>, Error> {
    let Some(extensions) = &cert.tbs_certificate.extensions else {
        return Ok(None);
    };
    for ext in extensions.iter().filter(|e| e.extn_id == SubjectAltName::OID) {
        let san = SubjectAltName::from_der(ext.extn_value.as_bytes())
            .map_err(|e| Error::Certificate(format!("SubjectAltName: {e}")))?;
        for name in san.0.iter() {
            if let GeneralName::Rfc822Name(email) = name {
                return Ok(Some(email.to_string()));
            }
        }
    }
    Ok(None)
}
