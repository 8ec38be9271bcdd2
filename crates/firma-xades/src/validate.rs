#![forbid(unsafe_code)]

//! The validation pipeline.
//!
//! 1. Decode and parse the document (terminal on failure).
//! 2. Locate `ds:Signature` (terminal, verdict unknown, when absent).
//! 3. Locate and decode the signer certificate (terminal on failure).
//! 4. Extract certificate, signer, profile and timestamp details.
//! 5. Check the certificate validity window.
//! 6. Verify the signature value and the reference digests.
//! 7. Check revocation.
//! 8. Combine into the verdict.

use crate::context::ValidationContext;
use crate::profile::classify;
use crate::reference::{verify_references, ReferenceOutcome};
use crate::signature::verify_signature_value;
use crate::timestamp::extract_timestamp;
use crate::verdict::SignatureVerdict;
use firma_core::ns;
use firma_x509::{
    check_revocation, check_validity, decode_certificate, extract_certificate_info,
    extract_signer_info, RevocationStatus, TemporalValidity,
};
use firma_xml::document::{element_text, find_descendant, find_element};
use std::panic::{self, AssertUnwindSafe};

pub const NO_SIGNATURE: &str = "no digital signature found in the document";
pub const UNSIGNED: &str = "document is not signed";
pub const NO_CERTIFICATE: &str = "no X509 certificate found in the signature";
pub const NOT_YET_VALID: &str = "certificate is not yet valid";
pub const EXPIRED: &str = "certificate has expired";
pub const SIGNATURE_INVALID: &str = "signature value is not mathematically valid";
pub const REVOKED: &str = "certificate has been revoked";

/// Validate the signature of one XML document.
///
/// Never fails and never panics; every problem is reported in the verdict.
pub fn validate(ctx: &ValidationContext, data: &[u8]) -> SignatureVerdict {
    match panic::catch_unwind(AssertUnwindSafe(|| run(ctx, data))) {
        Ok(verdict) => verdict,
        Err(_) => {
            tracing::error!("validation panicked");
            SignatureVerdict::invalid("unexpected internal error")
        }
    }
}

/// [`validate`] with the default context.
pub fn validate_bytes(data: &[u8]) -> SignatureVerdict {
    validate(&ValidationContext::default(), data)
}

fn run(ctx: &ValidationContext, data: &[u8]) -> SignatureVerdict {
    let text = match firma_xml::decode_text(data) {
        Ok(text) => text,
        Err(e) => return SignatureVerdict::invalid(format!("malformed XML: {e}")),
    };
    let doc = match firma_xml::parse(&text) {
        Ok(doc) => doc,
        Err(e) => return SignatureVerdict::invalid(format!("malformed XML: {e}")),
    };
    let root = doc.root_element();
    match root.tag_name().namespace() {
        Some(uri) if ns::is_facturae(uri) => tracing::debug!(namespace = uri, "Facturae document"),
        _ => tracing::debug!(element = root.tag_name().name(), "non-Facturae document"),
    }

    let Some(signature) = find_element(&doc, ns::DSIG, ns::node::SIGNATURE) else {
        tracing::info!("document is unsigned");
        return SignatureVerdict::unsigned();
    };

    let cert_b64 = find_descendant(signature, ns::DSIG, ns::node::X509_CERTIFICATE)
        .map(element_text)
        .filter(|text| !text.trim().is_empty());
    let Some(cert_b64) = cert_b64 else {
        return SignatureVerdict::invalid(NO_CERTIFICATE);
    };
    let cert = match decode_certificate(&cert_b64) {
        Ok(cert) => cert,
        Err(e) => {
            return SignatureVerdict::invalid(format!("failed to parse certificate: {e}"))
        }
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let now = ctx.now();
    let mut certificate = extract_certificate_info(&cert, now);
    let signer = extract_signer_info(&cert);

    match check_validity(&cert, now) {
        TemporalValidity::Valid => {}
        TemporalValidity::NotYetValid => {
            errors.push(NOT_YET_VALID.to_owned());
            certificate.is_expired = true;
        }
        TemporalValidity::Expired => {
            errors.push(EXPIRED.to_owned());
            certificate.is_expired = true;
        }
    }

    let profile = classify(signature);

    let signature_valid = verify_signature_value(signature, &cert);
    if !signature_valid {
        errors.push(SIGNATURE_INVALID.to_owned());
    }

    let mut references_valid = true;
    if ctx.verify_references {
        for check in verify_references(signature) {
            match check.outcome {
                ReferenceOutcome::Match => {}
                ReferenceOutcome::Mismatch => {
                    references_valid = false;
                    errors.push(format!("reference digest mismatch for URI '{}'", check.uri));
                }
                ReferenceOutcome::Dangling => {
                    references_valid = false;
                    errors.push(format!("reference target '{}' not found in the document", check.uri));
                }
                ReferenceOutcome::Unchecked(reason) => {
                    warnings.push(format!("reference '{}' could not be checked: {reason}", check.uri));
                }
            }
        }
    }

    let revocation =
        match check_revocation(&cert, ctx.ocsp_client.as_deref(), ctx.ocsp_timeout) {
            Ok(status) => status,
            Err(e) => {
                warnings.push(format!("revocation status could not be checked: {e}"));
                RevocationStatus::not_checked()
            }
        };
    if revocation.revoked == Some(true) {
        errors.push(REVOKED.to_owned());
    }

    let timestamp = extract_timestamp(signature);
    if let Some(warning) = timestamp.warning() {
        warnings.push(warning);
    }

    let valid = signature_valid
        && references_valid
        && !certificate.is_expired
        && revocation.revoked != Some(true);
    tracing::info!(
        valid,
        profile = %profile,
        errors = errors.len(),
        warnings = warnings.len(),
        "signature validated"
    );

    SignatureVerdict {
        valid: Some(valid),
        signer: Some(signer),
        certificate: Some(certificate),
        chain_valid: None,
        revoked: revocation.revoked,
        revocation_checked: revocation.checked,
        timestamp: timestamp.timestamp(),
        signature_type: Some(profile),
        errors,
        warnings,
    }
}
