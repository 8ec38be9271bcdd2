#![forbid(unsafe_code)]

//! Per-reference digest verification.
//!
//! The signature value only covers SignedInfo. Each `ds:Reference` inside it
//! binds a digest of the signed content, so the content is re-digested here.

use crate::transforms::{TransformData, TransformPipeline};
use base64::Engine;
use firma_core::{ns, Error};
use firma_xml::document::{build_id_map, element_text, find_child_element, find_child_elements};
use firma_xml::NodeSet;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceOutcome {
    /// The recomputed digest equals `DigestValue`.
    Match,
    /// The referenced content changed after signing.
    Mismatch,
    /// A same-document URI names an element that does not exist.
    Dangling,
    /// The reference could not be evaluated (external URI, unsupported
    /// transform or digest).
    Unchecked(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceCheck {
    pub uri: String,
    pub outcome: ReferenceOutcome,
}

/// Check every `ds:Reference` of the signature's SignedInfo, in document order.
pub fn verify_references(signature: roxmltree::Node<'_, '_>) -> Vec<ReferenceCheck> {
    let Some(signed_info) = find_child_element(signature, ns::DSIG, ns::node::SIGNED_INFO) else {
        return Vec::new();
    };
    let doc = signature.document();
    let id_map = build_id_map(doc);

    find_child_elements(signed_info, ns::DSIG, ns::node::REFERENCE)
        .into_iter()
        .map(|reference| {
            let uri = reference.attribute(ns::attr::URI).unwrap_or("").to_owned();
            let outcome = match check_reference(reference, doc, &id_map, signature) {
                Ok(outcome) => outcome,
                Err(e) => ReferenceOutcome::Unchecked(e.to_string()),
            };
            tracing::debug!(uri = %uri, ?outcome, "reference checked");
            ReferenceCheck { uri, outcome }
        })
        .collect()
}

fn check_reference<'d>(
    reference: roxmltree::Node<'_, '_>,
    doc: &'d roxmltree::Document<'d>,
    id_map: &HashMap<String, roxmltree::NodeId>,
    signature: roxmltree::Node<'_, '_>,
) -> Result<ReferenceOutcome, Error> {
    let uri = reference.attribute(ns::attr::URI).unwrap_or("");

    let digest_uri = find_child_element(reference, ns::DSIG, ns::node::DIGEST_METHOD)
        .ok_or_else(|| Error::MissingElement("DigestMethod".into()))?
        .attribute(ns::attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute("Algorithm on DigestMethod".into()))?;
    let expected = find_child_element(reference, ns::DSIG, ns::node::DIGEST_VALUE)
        .map(element_text)
        .ok_or_else(|| Error::MissingElement("DigestValue".into()))?;
    let expected: String = expected.chars().filter(|c| !c.is_whitespace()).collect();
    let expected = base64::engine::general_purpose::STANDARD
        .decode(expected)
        .map_err(|e| Error::Base64(format!("DigestValue: {e}")))?;

    let Some(node_set) = resolve_uri(uri, doc, id_map)? else {
        return Ok(ReferenceOutcome::Dangling);
    };

    let pipeline = match find_child_element(reference, ns::DSIG, ns::node::TRANSFORMS) {
        Some(transforms) => TransformPipeline::from_element(transforms, signature)?,
        None => TransformPipeline::default(),
    };
    let data = pipeline.execute(TransformData::Xml { doc, node_set })?;
    let computed = firma_crypto::digest::digest(digest_uri, &data.into_binary()?)?;

    Ok(if computed == expected {
        ReferenceOutcome::Match
    } else {
        ReferenceOutcome::Mismatch
    })
}

/// Resolve a same-document reference URI into its node set.
///
/// `Ok(None)` means the URI names an ID that no element carries.
fn resolve_uri(
    uri: &str,
    doc: &roxmltree::Document<'_>,
    id_map: &HashMap<String, roxmltree::NodeId>,
) -> Result<Option<NodeSet>, Error> {
    if uri.is_empty() {
        return Ok(Some(NodeSet::all_without_comments(doc)));
    }
    let Some(fragment) = uri.strip_prefix('#') else {
        return Err(Error::InvalidUri(uri.to_owned()));
    };
    if fragment == "xpointer(/)" {
        return Ok(Some(NodeSet::tree_with_comments(doc.root())));
    }
    let (id, with_comments) = match fragment
        .strip_prefix("xpointer(id(")
        .and_then(|rest| rest.strip_suffix("))"))
    {
        Some(quoted) => (quoted.trim_matches(|c| c == '\'' || c == '"'), true),
        None => (fragment, false),
    };
    let node = id_map.get(id).and_then(|node_id| doc.get_node(*node_id));
    Ok(node.map(|node| {
        if with_comments {
            NodeSet::tree_with_comments(node)
        } else {
            NodeSet::tree_without_comments(node)
        }
    }))
}
