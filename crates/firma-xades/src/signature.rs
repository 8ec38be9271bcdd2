#![forbid(unsafe_code)]

//! Cryptographic verification of `ds:SignatureValue`.

use crate::transforms::read_inclusive_prefixes;
use base64::Engine;
use der::Encode;
use firma_c14n::C14nMode;
use firma_core::{ns, Error};
use firma_crypto::{HashAlgorithm, PublicKey};
use firma_xml::document::{element_text, find_child_element, find_descendant};
use x509_cert::Certificate;

/// Whether the signature value verifies over the canonical SignedInfo under
/// the certificate's public key.
///
/// Never fails: any decoding, canonicalization or key problem is logged and
/// reported as `false`.
pub fn verify_signature_value(signature: roxmltree::Node<'_, '_>, cert: &Certificate) -> bool {
    match try_verify(signature, cert) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!(error = %e, "signature value could not be verified");
            false
        }
    }
}

fn try_verify(signature: roxmltree::Node<'_, '_>, cert: &Certificate) -> Result<bool, Error> {
    let value = find_descendant(signature, ns::DSIG, ns::node::SIGNATURE_VALUE)
        .map(element_text)
        .ok_or_else(|| Error::MissingElement("SignatureValue".into()))?;
    let value: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if value.is_empty() {
        return Err(Error::MissingElement("SignatureValue content".into()));
    }
    let value = base64::engine::general_purpose::STANDARD
        .decode(value)
        .map_err(|e| Error::Base64(format!("SignatureValue: {e}")))?;

    let signed_info = find_descendant(signature, ns::DSIG, ns::node::SIGNED_INFO)
        .ok_or_else(|| Error::MissingElement("SignedInfo".into()))?;
    let (mode, prefixes) = canonicalization_of(signed_info);
    let canonical = firma_c14n::canonicalize_subtree(signed_info, mode, &prefixes)?;

    let method = find_descendant(signature, ns::DSIG, ns::node::SIGNATURE_METHOD)
        .and_then(|m| m.attribute(ns::attr::ALGORITHM))
        .unwrap_or("");
    let hash = HashAlgorithm::from_signature_method(method);

    let spki = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| Error::Certificate(format!("SubjectPublicKeyInfo: {e}")))?;
    let key = PublicKey::from_spki_der(&spki)?;

    tracing::debug!(
        c14n = mode.uri(),
        ?hash,
        key = key.family(),
        "verifying signature value"
    );
    key.verify(hash, &canonical, &value)
}

/// The C14N mode SignedInfo declares, with its PrefixList.
///
/// Exclusive C14N when the method is missing or unrecognised.
fn canonicalization_of(signed_info: roxmltree::Node<'_, '_>) -> (C14nMode, Vec<String>) {
    let Some(method) = find_child_element(signed_info, ns::DSIG, ns::node::CANONICALIZATION_METHOD)
    else {
        return (C14nMode::default(), Vec::new());
    };
    let mode = method
        .attribute(ns::attr::ALGORITHM)
        .and_then(C14nMode::from_uri)
        .unwrap_or_default();
    let prefixes = if mode.is_exclusive() {
        read_inclusive_prefixes(method)
    } else {
        Vec::new()
    };
    (mode, prefixes)
}
