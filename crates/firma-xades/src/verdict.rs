#![forbid(unsafe_code)]

//! The structured result of one validation.

use chrono::{DateTime, Utc};
use firma_x509::{CertificateInfo, SignerInfo};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Detected signature profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureProfile {
    #[serde(rename = "XMLDSig")]
    XmlDsig,
    #[serde(rename = "XAdES-BES")]
    XadesBes,
    #[serde(rename = "XAdES-T")]
    XadesT,
    #[serde(rename = "XAdES-C")]
    XadesC,
    #[serde(rename = "XAdES-XL")]
    XadesXl,
}

impl SignatureProfile {
    pub fn label(&self) -> &'static str {
        match self {
            Self::XmlDsig => "XMLDSig",
            Self::XadesBes => "XAdES-BES",
            Self::XadesT => "XAdES-T",
            Self::XadesC => "XAdES-C",
            Self::XadesXl => "XAdES-XL",
        }
    }
}

impl fmt::Display for SignatureProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of validating one document.
///
/// `valid` is `None` when the document carries no signature at all.
/// `errors` explains every `false`/`None`; `warnings` never change `valid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureVerdict {
    pub valid: Option<bool>,
    pub signer: Option<SignerInfo>,
    pub certificate: Option<CertificateInfo>,
    /// Trust-chain validation is not performed; always `None`.
    pub chain_valid: Option<bool>,
    pub revoked: Option<bool>,
    pub revocation_checked: bool,
    pub timestamp: Option<DateTime<Utc>>,
    pub signature_type: Option<SignatureProfile>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl SignatureVerdict {
    fn empty(valid: Option<bool>) -> Self {
        Self {
            valid,
            signer: None,
            certificate: None,
            chain_valid: None,
            revoked: None,
            revocation_checked: false,
            timestamp: None,
            signature_type: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// A terminal invalid verdict carrying a single error.
    pub fn invalid(error: impl Into<String>) -> Self {
        let mut verdict = Self::empty(Some(false));
        verdict.errors.push(error.into());
        verdict
    }

    /// The verdict for a well-formed document without a signature.
    pub fn unsigned() -> Self {
        let mut verdict = Self::empty(None);
        verdict.errors.push(crate::validate::NO_SIGNATURE.to_owned());
        verdict.warnings.push(crate::validate::UNSIGNED.to_owned());
        verdict
    }

    pub fn is_valid(&self) -> bool {
        self.valid == Some(true)
    }
}
