#![forbid(unsafe_code)]

//! Start-tag pieces shared by the inclusive and exclusive serializers.

use crate::escape;
use std::cmp::Ordering;

/// A namespace declaration to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsDecl {
    /// "" for the default namespace.
    pub prefix: String,
    pub uri: String,
}

impl NsDecl {
    pub fn render(&self) -> String {
        if self.prefix.is_empty() {
            format!(" xmlns=\"{}\"", escape::escape_attr(&self.uri))
        } else {
            format!(" xmlns:{}=\"{}\"", self.prefix, escape::escape_attr(&self.uri))
        }
    }
}

impl Ord for NsDecl {
    // Default namespace first, then by prefix.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.prefix.is_empty(), other.prefix.is_empty()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self.prefix.cmp(&other.prefix),
        }
    }
}

impl PartialOrd for NsDecl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An attribute to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// "" when the attribute has no namespace.
    pub ns_uri: String,
    pub local_name: String,
    pub qualified_name: String,
    pub value: String,
}

impl Attr {
    /// Build from a roxmltree attribute, recovering its prefix from `node`.
    pub fn from_node(node: roxmltree::Node<'_, '_>, attr: &roxmltree::Attribute<'_, '_>) -> Self {
        let qualified_name = match firma_xml::document::attribute_prefix(node, attr) {
            Some(prefix) => format!("{}:{}", prefix, attr.name()),
            None => attr.name().to_owned(),
        };
        Self {
            ns_uri: attr.namespace().unwrap_or("").to_owned(),
            local_name: attr.name().to_owned(),
            qualified_name,
            value: attr.value().to_owned(),
        }
    }

    pub fn render(&self) -> String {
        format!(" {}=\"{}\"", self.qualified_name, escape::escape_attr(&self.value))
    }
}

impl Ord for Attr {
    // Unqualified attributes first, then by (namespace URI, local name).
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.ns_uri.is_empty(), other.ns_uri.is_empty()) {
            (true, true) => self.local_name.cmp(&other.local_name),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self
                .ns_uri
                .cmp(&other.ns_uri)
                .then_with(|| self.local_name.cmp(&other.local_name)),
        }
    }
}

impl PartialOrd for Attr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Write a start tag with its namespace declarations and attributes.
pub fn write_start_tag(output: &mut Vec<u8>, name: &str, ns_decls: &[NsDecl], attrs: &[Attr]) {
    output.push(b'<');
    output.extend_from_slice(name.as_bytes());
    for decl in ns_decls {
        output.extend_from_slice(decl.render().as_bytes());
    }
    for attr in attrs {
        output.extend_from_slice(attr.render().as_bytes());
    }
    output.push(b'>');
}

pub fn write_end_tag(output: &mut Vec<u8>, name: &str) {
    output.extend_from_slice(b"</");
    output.extend_from_slice(name.as_bytes());
    output.push(b'>');
}

/// Write a comment or processing instruction.
///
/// Nodes outside the document element are separated from it by a line feed.
pub fn write_misc(output: &mut Vec<u8>, node: roxmltree::Node<'_, '_>, with_comments: bool) {
    let body = match node.node_type() {
        roxmltree::NodeType::Comment if with_comments => {
            format!("<!--{}-->", node.text().unwrap_or(""))
        }
        roxmltree::NodeType::PI => match node.pi() {
            Some(pi) => match pi.value.filter(|v| !v.is_empty()) {
                Some(value) => format!("<?{} {}?>", pi.target, escape::escape_pi(value)),
                None => format!("<?{}?>", pi.target),
            },
            None => return,
        },
        _ => return,
    };

    let at_top_level = node
        .parent()
        .is_some_and(|p| p.node_type() == roxmltree::NodeType::Root);
    if at_top_level && node.prev_siblings().any(|s| s.is_element()) {
        output.push(b'\n');
    }
    output.extend_from_slice(body.as_bytes());
    if at_top_level && node.next_siblings().any(|s| s.is_element()) {
        output.push(b'\n');
    }
}
