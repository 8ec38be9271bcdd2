#![forbid(unsafe_code)]

//! Signing-time extraction.

use chrono::{DateTime, NaiveDateTime, Utc};
use firma_core::ns;
use firma_xml::document::{element_text, find_descendant};

/// What the signature says about when it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampOutcome {
    /// A parseable `xades:SigningTime`.
    SigningTime(DateTime<Utc>),
    /// A `xades:SignatureTimeStamp` with an RFC 3161 token. Tokens are not decoded.
    EncapsulatedToken,
    /// `xades:SigningTime` is present but not ISO-8601.
    Unparseable(String),
    Absent,
}

impl TimestampOutcome {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::SigningTime(t) => Some(*t),
            _ => None,
        }
    }

    /// Advisory text for outcomes that lose information.
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Unparseable(raw) => Some(format!("signing time could not be parsed: '{raw}'")),
            Self::EncapsulatedToken => {
                Some("signature time-stamp token present but not decoded".to_owned())
            }
            _ => None,
        }
    }
}

/// Read the signing time from a `ds:Signature` element.
///
/// `xades:SigningTime` wins when it has content, even if it fails to parse.
pub fn extract_timestamp(signature: roxmltree::Node<'_, '_>) -> TimestampOutcome {
    if let Some(node) = find_descendant(signature, ns::XADES, ns::node::SIGNING_TIME) {
        let raw = element_text(node);
        let raw = raw.trim();
        if !raw.is_empty() {
            return match parse_signing_time(raw) {
                Some(t) => TimestampOutcome::SigningTime(t),
                None => TimestampOutcome::Unparseable(raw.to_owned()),
            };
        }
    }

    let token = find_descendant(signature, ns::XADES, ns::node::SIGNATURE_TIME_STAMP)
        .and_then(|ts| find_descendant(ts, ns::XADES, ns::node::ENCAPSULATED_TIME_STAMP))
        .map(element_text);
    match token {
        Some(t) if !t.trim().is_empty() => TimestampOutcome::EncapsulatedToken,
        _ => TimestampOutcome::Absent,
    }
}

/// Parse an ISO-8601 instant. Values without an offset are taken as UTC.
pub fn parse_signing_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
