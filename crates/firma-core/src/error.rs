#![forbid(unsafe_code)]

/// Everything that can go wrong below the verdict.
///
/// The validation pipeline turns these into verdict errors or warnings; they
/// never reach a caller of `firma_xades::validate`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The bytes are not a well-formed XML document.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("element not found: {0}")]
    MissingElement(String),

    #[error("attribute not found: {0}")]
    MissingAttribute(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Malformed key or signature material.
    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("invalid base64: {0}")]
    Base64(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("transform error: {0}")]
    Transform(String),

    /// A reference URI that does not point into the signed document.
    #[error("unsupported reference URI: {0}")]
    InvalidUri(String),

    #[error("revocation check failed: {0}")]
    Revocation(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
