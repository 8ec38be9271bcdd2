#![forbid(unsafe_code)]

//! Reference transforms.
//!
//! Supported: enveloped-signature, the C14N family, and the XPath filter
//! `not(ancestor-or-self::PREFIX:Signature)` that older signers use in place
//! of enveloped-signature.

use firma_c14n::C14nMode;
use firma_core::{algorithm, ns, Error};
use firma_xml::NodeSet;

/// Data flowing through the transform pipeline.
pub enum TransformData<'d> {
    /// A node set over the signed document.
    Xml {
        doc: &'d roxmltree::Document<'d>,
        node_set: NodeSet,
    },
    /// Octets produced by canonicalization.
    Binary(Vec<u8>),
}

impl TransformData<'_> {
    /// Convert to octets. A remaining node set is serialized with inclusive
    /// C14N 1.0; comments survive only if the node set kept them.
    pub fn into_binary(self) -> Result<Vec<u8>, Error> {
        match self {
            TransformData::Binary(data) => Ok(data),
            TransformData::Xml { doc, node_set } => firma_c14n::canonicalize_doc(
                doc,
                C14nMode::InclusiveWithComments,
                Some(&node_set),
                &[],
            ),
        }
    }
}

/// Trait for individual transforms.
pub trait Transform<'d> {
    /// The algorithm URI for this transform.
    fn uri(&self) -> &str;

    fn execute(&self, input: TransformData<'d>) -> Result<TransformData<'d>, Error>;
}

/// A pipeline of transforms executed in sequence.
#[derive(Default)]
pub struct TransformPipeline<'d> {
    transforms: Vec<Box<dyn Transform<'d>>>,
}

impl<'d> TransformPipeline<'d> {
    /// Build the pipeline declared by a `ds:Transforms` element.
    ///
    /// `signature` is the `ds:Signature` the reference belongs to.
    pub fn from_element(
        transforms: roxmltree::Node<'_, '_>,
        signature: roxmltree::Node<'_, '_>,
    ) -> Result<Self, Error> {
        let mut pipeline = Self::default();
        for node in firma_xml::document::find_child_elements(transforms, ns::DSIG, ns::node::TRANSFORM)
        {
            let uri = node
                .attribute(ns::attr::ALGORITHM)
                .ok_or_else(|| Error::MissingAttribute("Algorithm on Transform".into()))?;
            let transform: Box<dyn Transform<'d>> = match uri {
                algorithm::ENVELOPED_SIGNATURE => {
                    Box::new(EnvelopedSignatureTransform::new(signature.id()))
                }
                algorithm::XPATH if is_enveloped_xpath(node) => {
                    Box::new(EnvelopedSignatureTransform::new(signature.id()))
                }
                algorithm::XPATH => {
                    return Err(Error::UnsupportedAlgorithm("XPath filter expression".into()))
                }
                _ => match C14nMode::from_uri(uri) {
                    Some(mode) => Box::new(C14nTransform::new(mode, read_inclusive_prefixes(node))),
                    None => return Err(Error::UnsupportedAlgorithm(format!("transform: {uri}"))),
                },
            };
            pipeline.transforms.push(transform);
        }
        Ok(pipeline)
    }

    /// Execute all transforms in order.
    pub fn execute(&self, input: TransformData<'d>) -> Result<TransformData<'d>, Error> {
        let mut data = input;
        for transform in &self.transforms {
            tracing::trace!(transform = transform.uri(), "applying transform");
            data = transform.execute(data)?;
        }
        Ok(data)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// Removes the enclosing `ds:Signature` subtree from the node set.
pub struct EnvelopedSignatureTransform {
    signature: roxmltree::NodeId,
}

impl EnvelopedSignatureTransform {
    pub fn new(signature: roxmltree::NodeId) -> Self {
        Self { signature }
    }
}

impl<'d> Transform<'d> for EnvelopedSignatureTransform {
    fn uri(&self) -> &str {
        algorithm::ENVELOPED_SIGNATURE
    }

    fn execute(&self, input: TransformData<'d>) -> Result<TransformData<'d>, Error> {
        match input {
            TransformData::Xml { doc, mut node_set } => {
                let signature = doc
                    .get_node(self.signature)
                    .ok_or_else(|| Error::Transform("signature node not in document".into()))?;
                node_set.remove_subtree(signature);
                Ok(TransformData::Xml { doc, node_set })
            }
            TransformData::Binary(_) => Err(Error::Transform(
                "enveloped-signature transform requires XML input".into(),
            )),
        }
    }
}

/// A canonicalization transform.
pub struct C14nTransform {
    mode: C14nMode,
    inclusive_prefixes: Vec<String>,
}

impl C14nTransform {
    pub fn new(mode: C14nMode, inclusive_prefixes: Vec<String>) -> Self {
        Self {
            mode,
            inclusive_prefixes,
        }
    }
}

impl<'d> Transform<'d> for C14nTransform {
    fn uri(&self) -> &str {
        self.mode.uri()
    }

    fn execute(&self, input: TransformData<'d>) -> Result<TransformData<'d>, Error> {
        let bytes = match input {
            TransformData::Xml { doc, node_set } => firma_c14n::canonicalize_doc(
                doc,
                self.mode,
                Some(&node_set),
                &self.inclusive_prefixes,
            )?,
            TransformData::Binary(data) => {
                let text = std::str::from_utf8(&data)
                    .map_err(|e| Error::Transform(format!("invalid UTF-8: {e}")))?;
                let doc = firma_xml::parse(text)?;
                firma_c14n::canonicalize_doc(&doc, self.mode, None, &self.inclusive_prefixes)?
            }
        };
        Ok(TransformData::Binary(bytes))
    }
}

/// The `ec:InclusiveNamespaces/@PrefixList` of a C14N method or transform.
pub fn read_inclusive_prefixes(node: roxmltree::Node<'_, '_>) -> Vec<String> {
    node.children()
        .filter(|c| c.is_element() && c.tag_name().name() == ns::node::INCLUSIVE_NAMESPACES)
        .find_map(|c| c.attribute(ns::attr::PREFIX_LIST))
        .map(|list| list.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

/// Whether a Transform holds `not(ancestor-or-self::PREFIX:Signature)` with
/// PREFIX bound to the XML-DSig namespace.
fn is_enveloped_xpath(transform: roxmltree::Node<'_, '_>) -> bool {
    let Some(xpath) = firma_xml::document::find_child_element(transform, ns::DSIG, ns::node::XPATH)
    else {
        return false;
    };
    let expr: String = xpath
        .text()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let Some(prefix) = expr
        .strip_prefix("not(ancestor-or-self::")
        .and_then(|rest| rest.strip_suffix(":Signature)"))
    else {
        return false;
    };
    xpath
        .namespaces()
        .any(|decl| decl.name() == Some(prefix) && decl.uri() == ns::DSIG)
}
