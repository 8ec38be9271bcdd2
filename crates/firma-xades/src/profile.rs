#![forbid(unsafe_code)]

//! Signature-profile classification.

use crate::verdict::SignatureProfile;
use firma_core::ns;
use firma_xml::document::find_descendant;

/// Classify a `ds:Signature` element by the XAdES properties it carries.
///
/// | QualifyingProperties | cert + revocation refs | SignatureTimeStamp | profile |
/// |---|---|---|---|
/// | absent | - | - | XMLDSig |
/// | present | both | yes | XAdES-XL |
/// | present | both | no | XAdES-C |
/// | present | not both | yes | XAdES-T |
/// | present | not both | no | XAdES-BES |
pub fn classify(signature: roxmltree::Node<'_, '_>) -> SignatureProfile {
    let has = |name: &str| find_descendant(signature, ns::XADES, name).is_some();

    let profile = if !has(ns::node::QUALIFYING_PROPERTIES) {
        SignatureProfile::XmlDsig
    } else {
        let timestamped = has(ns::node::SIGNATURE_TIME_STAMP);
        let complete_refs =
            has(ns::node::COMPLETE_CERTIFICATE_REFS) && has(ns::node::COMPLETE_REVOCATION_REFS);
        match (complete_refs, timestamped) {
            (true, true) => SignatureProfile::XadesXl,
            (true, false) => SignatureProfile::XadesC,
            (false, true) => SignatureProfile::XadesT,
            (false, false) => SignatureProfile::XadesBes,
        }
    };
    tracing::debug!(%profile, "classified signature");
    profile
}
