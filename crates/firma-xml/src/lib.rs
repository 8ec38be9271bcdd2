#![forbid(unsafe_code)]

//! XML document helpers for the firma signature validator.
//!
//! Thin layer over `roxmltree`: byte decoding, namespace-aware element
//! lookup, qualified-name recovery and the `NodeSet` used to describe
//! document subsets for canonicalization.

pub mod document;
pub mod nodeset;

pub use document::{decode_text, parse};
pub use nodeset::NodeSet;

/// Deepest element nesting accepted by [`parse`].
///
/// Facturae invoices nest a few dozen levels at most.
pub const MAX_DEPTH: usize = 256;

/// Return the roxmltree parsing options used for untrusted input.
///
/// DTDs are rejected; signed invoices never carry one.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: false,
        ..roxmltree::ParsingOptions::default()
    }
}
