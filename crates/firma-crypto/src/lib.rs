#![forbid(unsafe_code)]

//! Cryptographic primitives for the firma signature validator.
//!
//! Reference digests are selected by their XML-DSig URI. Signature values
//! are checked against the signer certificate's public key, RSA PKCS#1 v1.5
//! or ECDSA over P-256/P-384/P-521.

pub mod digest;
pub mod verify;

pub use digest::DigestMethod;
pub use verify::{HashAlgorithm, PublicKey};
