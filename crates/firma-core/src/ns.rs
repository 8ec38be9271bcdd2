#![forbid(unsafe_code)]

//! XML namespace constants used across the library.

/// XML Digital Signature namespace
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// XAdES 1.3.2 namespace
pub const XADES: &str = "http://uri.etsi.org/01903/v1.3.2#";

/// Facturae 3.2.2 document namespace
pub const FACTURAE_322: &str = "http://www.facturae.gob.es/formato/Versiones/Facturaev3_2_2.xml";

/// Facturae 3.2.1 document namespace
pub const FACTURAE_321: &str = "http://www.facturae.gob.es/formato/Versiones/Facturaev3_2_1.xml";

/// Facturae 3.2 document namespace
pub const FACTURAE_32: &str = "http://www.facturae.es/Facturae/2009/v3.2/Facturae";

/// XML namespace
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix → namespace table, fixed at compile time.
pub const NAMESPACES: &[(&str, &str)] = &[("ds", DSIG), ("xades", XADES), ("fe", FACTURAE_322)];

/// Look up the namespace URI bound to a well-known prefix.
pub fn uri_for_prefix(prefix: &str) -> Option<&'static str> {
    NAMESPACES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, uri)| *uri)
}

/// Whether a document element namespace identifies a Facturae invoice.
pub fn is_facturae(namespace: &str) -> bool {
    matches!(namespace, FACTURAE_322 | FACTURAE_321 | FACTURAE_32)
}

// ── Element names ────────────────────────────────────────────────────

pub mod node {
    // DSig elements
    pub const SIGNATURE: &str = "Signature";
    pub const SIGNED_INFO: &str = "SignedInfo";
    pub const CANONICALIZATION_METHOD: &str = "CanonicalizationMethod";
    pub const SIGNATURE_METHOD: &str = "SignatureMethod";
    pub const SIGNATURE_VALUE: &str = "SignatureValue";
    pub const REFERENCE: &str = "Reference";
    pub const TRANSFORMS: &str = "Transforms";
    pub const TRANSFORM: &str = "Transform";
    pub const DIGEST_METHOD: &str = "DigestMethod";
    pub const DIGEST_VALUE: &str = "DigestValue";
    pub const KEY_INFO: &str = "KeyInfo";
    pub const X509_DATA: &str = "X509Data";
    pub const X509_CERTIFICATE: &str = "X509Certificate";
    pub const XPATH: &str = "XPath";
    pub const INCLUSIVE_NAMESPACES: &str = "InclusiveNamespaces";

    // XAdES elements
    pub const QUALIFYING_PROPERTIES: &str = "QualifyingProperties";
    pub const SIGNING_TIME: &str = "SigningTime";
    pub const SIGNATURE_TIME_STAMP: &str = "SignatureTimeStamp";
    pub const ENCAPSULATED_TIME_STAMP: &str = "EncapsulatedTimeStamp";
    pub const COMPLETE_CERTIFICATE_REFS: &str = "CompleteCertificateRefs";
    pub const COMPLETE_REVOCATION_REFS: &str = "CompleteRevocationRefs";
}

// ── Attribute names ──────────────────────────────────────────────────

pub mod attr {
    pub const URI: &str = "URI";
    pub const ALGORITHM: &str = "Algorithm";
    pub const PREFIX_LIST: &str = "PrefixList";
    /// Attribute names registered as element identifiers.
    pub const ID_ATTRS: [&str; 3] = ["Id", "ID", "id"];
}
