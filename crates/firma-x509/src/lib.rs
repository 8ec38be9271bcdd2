#![forbid(unsafe_code)]

//! Signer certificate inspection for the firma signature validator.
//!
//! Every extractor here is advisory: failures degrade to empty values so a
//! damaged certificate field never stops the rest of the validation.

pub mod certificate;
pub mod name;
pub mod revocation;
pub mod signer;

#[cfg(test)]
pub(crate) mod testcert;

pub use certificate::{
    check_validity, decode_certificate, extract_certificate_info, CertificateInfo,
    TemporalValidity,
};
pub use revocation::{check_revocation, OcspClient, OcspStatus, RevocationStatus};
pub use signer::{extract_signer_info, SignerInfo};
pub use x509_cert::Certificate;
