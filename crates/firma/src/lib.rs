#![forbid(unsafe_code)]

//! Facturae signature validation: the workspace crates under one roof.

pub use firma_c14n as c14n;
pub use firma_core as core;
pub use firma_crypto as crypto;
pub use firma_x509 as x509;
pub use firma_xades as xades;
pub use firma_xml as xml;

pub use firma_xades::{validate, validate_bytes, SignatureVerdict, ValidationContext};

pub mod logging;
