#![forbid(unsafe_code)]

//! XAdES / XML-DSig signature validation for Facturae invoices.
//!
//! [`validate`] takes the raw bytes of one XML document and always returns a
//! [`SignatureVerdict`]; malformed or hostile input degrades to an invalid
//! verdict with an explanation instead of an error.

pub mod context;
pub mod profile;
pub mod reference;
pub mod signature;
pub mod timestamp;
pub mod transforms;
pub mod validate;
pub mod verdict;

#[cfg(test)]
mod testsupport;

pub use context::ValidationContext;
pub use profile::classify;
pub use timestamp::{extract_timestamp, TimestampOutcome};
pub use validate::{validate, validate_bytes};
pub use verdict::{SignatureProfile, SignatureVerdict};
