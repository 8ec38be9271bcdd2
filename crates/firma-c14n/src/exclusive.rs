#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N).
//!
//! Only "visibly utilized" namespace declarations are output. A prefix is
//! visibly utilized by an element when:
//! 1. the element's tag name uses it (the default namespace for unprefixed names),
//! 2. one of the element's attributes uses it, or
//! 3. it appears in the InclusiveNamespaces PrefixList (`#default` for "").

use crate::render::{self, Attr, NsDecl};
use firma_core::Error;
use firma_xml::document::{element_prefix, inscope_namespaces, qualified_name};
use firma_xml::NodeSet;
use std::collections::{BTreeMap, BTreeSet};

/// Canonicalize using Exclusive C14N 1.0.
pub fn canonicalize(
    doc: &roxmltree::Document<'_>,
    with_comments: bool,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    let inclusive_prefixes = inclusive_prefixes
        .iter()
        .map(|p| if p == "#default" { String::new() } else { p.clone() })
        .collect();
    let ctx = ExcC14nContext {
        with_comments,
        node_set,
        inclusive_prefixes,
    };
    let mut output = Vec::new();
    ctx.process_node(doc.root(), &mut output, &BTreeMap::new())?;
    Ok(output)
}

struct ExcC14nContext<'a> {
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
    inclusive_prefixes: BTreeSet<String>,
}

impl ExcC14nContext<'_> {
    fn is_visible(&self, node: &roxmltree::Node<'_, '_>) -> bool {
        self.node_set.map_or(true, |set| set.contains(node))
    }

    fn process_node(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        match node.node_type() {
            roxmltree::NodeType::Root => {
                for child in node.children() {
                    self.process_node(child, output, rendered_ns)?;
                }
            }
            roxmltree::NodeType::Element => self.process_element(node, output, rendered_ns)?,
            roxmltree::NodeType::Text => {
                if self.is_visible(&node) {
                    let text = node.text().unwrap_or("");
                    output.extend_from_slice(crate::escape::escape_text(text).as_bytes());
                }
            }
            roxmltree::NodeType::Comment | roxmltree::NodeType::PI => {
                if self.is_visible(&node) {
                    render::write_misc(output, node, self.with_comments);
                }
            }
        }
        Ok(())
    }

    fn process_element(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        if !self.is_visible(&node) {
            for child in node.children() {
                self.process_node(child, output, rendered_ns)?;
            }
            return Ok(());
        }

        let mut attrs: Vec<Attr> = node
            .attributes()
            .map(|attr| Attr::from_node(node, &attr))
            .collect();
        attrs.sort();

        let mut utilized: BTreeSet<String> = self.inclusive_prefixes.clone();
        utilized.insert(element_prefix(node).to_owned());
        for attr in &attrs {
            if let Some((prefix, _)) = attr.qualified_name.split_once(':') {
                utilized.insert(prefix.to_owned());
            }
        }
        utilized.remove("xml");

        let scope = inscope_namespaces(node);
        let mut ns_decls = Vec::new();
        for prefix in &utilized {
            match scope.get(prefix) {
                Some(uri) if rendered_ns.get(prefix) != Some(uri) => ns_decls.push(NsDecl {
                    prefix: prefix.clone(),
                    uri: uri.clone(),
                }),
                None if prefix.is_empty()
                    && rendered_ns.get("").is_some_and(|d| !d.is_empty()) =>
                {
                    ns_decls.push(NsDecl {
                        prefix: String::new(),
                        uri: String::new(),
                    })
                }
                _ => {}
            }
        }
        ns_decls.sort();

        let name = qualified_name(node);
        render::write_start_tag(output, name, &ns_decls, &attrs);
        let mut child_rendered = rendered_ns.clone();
        for decl in ns_decls {
            child_rendered.insert(decl.prefix, decl.uri);
        }
        for child in node.children() {
            self.process_node(child, output, &child_rendered)?;
        }
        render::write_end_tag(output, name);
        Ok(())
    }
}
