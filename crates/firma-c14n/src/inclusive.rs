#![forbid(unsafe_code)]

//! Inclusive Canonical XML 1.0 and 1.1.
//!
//! Every in-scope namespace binding is rendered on the first visible element
//! that carries it. In a document subset, an apex element whose parent is not
//! visible also picks up the `xml:*` attributes of its ancestors (1.1 leaves
//! `xml:id` out of that inheritance).

use crate::render::{self, Attr, NsDecl};
use firma_core::{ns, Error};
use firma_xml::document::{inscope_namespaces, qualified_name};
use firma_xml::NodeSet;
use std::collections::BTreeMap;

/// Canonicalize a document (or the subset named by `node_set`).
pub fn canonicalize(
    doc: &roxmltree::Document<'_>,
    with_comments: bool,
    v11: bool,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    let mut output = Vec::new();
    let ctx = C14nContext {
        with_comments,
        v11,
        node_set,
    };
    ctx.process_node(doc.root(), &mut output, &BTreeMap::new())?;
    Ok(output)
}

struct C14nContext<'a> {
    with_comments: bool,
    v11: bool,
    node_set: Option<&'a NodeSet>,
}

impl C14nContext<'_> {
    fn is_visible(&self, node: &roxmltree::Node<'_, '_>) -> bool {
        self.node_set.map_or(true, |set| set.contains(node))
    }

    fn process_node(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        inherited_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        match node.node_type() {
            roxmltree::NodeType::Root => {
                for child in node.children() {
                    self.process_node(child, output, inherited_ns)?;
                }
            }
            roxmltree::NodeType::Element => self.process_element(node, output, inherited_ns)?,
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
        inherited_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        if !self.is_visible(&node) {
            // Descendants compare against the nearest visible ancestor.
            for child in node.children() {
                self.process_node(child, output, inherited_ns)?;
            }
            return Ok(());
        }

        let scope = inscope_namespaces(node);
        let mut ns_decls: Vec<NsDecl> = scope
            .iter()
            .filter(|(prefix, uri)| inherited_ns.get(*prefix) != Some(*uri))
            .map(|(prefix, uri)| NsDecl {
                prefix: prefix.clone(),
                uri: uri.clone(),
            })
            .collect();
        if !scope.contains_key("") && inherited_ns.get("").is_some_and(|d| !d.is_empty()) {
            ns_decls.push(NsDecl {
                prefix: String::new(),
                uri: String::new(),
            });
        }
        ns_decls.sort();

        let mut attrs: Vec<Attr> = node
            .attributes()
            .map(|attr| Attr::from_node(node, &attr))
            .collect();
        if self.node_set.is_some() {
            let parent_hidden = node
                .parent()
                .map_or(true, |p| !p.is_element() || !self.is_visible(&p));
            if parent_hidden {
                let extra = self.inherited_xml_attrs(&node, &attrs);
                attrs.extend(extra);
            }
        }
        attrs.sort();

        let name = qualified_name(node);
        render::write_start_tag(output, name, &ns_decls, &attrs);
        let mut child_ns = scope;
        if !child_ns.contains_key("") && inherited_ns.contains_key("") {
            child_ns.insert(String::new(), String::new());
        }
        for child in node.children() {
            self.process_node(child, output, &child_ns)?;
        }
        render::write_end_tag(output, name);
        Ok(())
    }

    /// `xml:*` attributes of ancestors not already present on `node`.
    /// The nearest ancestor wins.
    fn inherited_xml_attrs(
        &self,
        node: &roxmltree::Node<'_, '_>,
        existing: &[Attr],
    ) -> Vec<Attr> {
        let mut inherited: BTreeMap<String, String> = BTreeMap::new();
        for ancestor in node.ancestors().skip(1).filter(|a| a.is_element()) {
            for attr in ancestor.attributes() {
                if attr.namespace() != Some(ns::XML) || (self.v11 && attr.name() == "id") {
                    continue;
                }
                inherited
                    .entry(attr.name().to_owned())
                    .or_insert_with(|| attr.value().to_owned());
            }
        }

        inherited
            .into_iter()
            .filter(|(name, _)| {
                !existing
                    .iter()
                    .any(|a| a.ns_uri == ns::XML && a.local_name == *name)
            })
            .map(|(name, value)| Attr {
                ns_uri: ns::XML.to_owned(),
                qualified_name: format!("xml:{name}"),
                local_name: name,
                value,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c14n(xml: &str) -> String {
        let doc = roxmltree::Document::parse(xml).unwrap();
        String::from_utf8(canonicalize(&doc, false, false, None).unwrap()).unwrap()
    }

    #[test]
    fn test_simple_c14n() {
        assert_eq!(
            c14n(r#"<root><a b="1" a="2"/></root>"#),
            r#"<root><a a="2" b="1"></a></root>"#
        );
    }

    #[test]
    fn test_namespaces_rendered_once() {
        assert_eq!(
            c14n(r#"<root xmlns:b="http://b" xmlns:a="http://a"><a:child xmlns:a="http://a"/></root>"#),
            r#"<root xmlns:a="http://a" xmlns:b="http://b"><a:child></a:child></root>"#
        );
    }

    #[test]
    fn test_attribute_keeps_written_prefix_for_shared_uri() {
        assert_eq!(
            c14n(r#"<doc xmlns:ds="http://u" xmlns:dup="http://u"><ds:y dup:b="2"/></doc>"#),
            r#"<doc xmlns:ds="http://u" xmlns:dup="http://u"><ds:y dup:b="2"></ds:y></doc>"#
        );
    }

    #[test]
    fn test_text_escaping_and_comments() {
        assert_eq!(
            c14n("<?xml version=\"1.0\"?>\n<root>a &amp; b &lt; c<!-- gone --></root>"),
            "<root>a &amp; b &lt; c</root>"
        );
    }

    #[test]
    fn test_xml_attrs_inherited_by_apex() {
        let xml = r#"<a xml:lang="es" xml:id="x"><b/></a>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let b = doc.root_element().first_element_child().unwrap();
        let set = NodeSet::tree_without_comments(b);

        let v10 = canonicalize(&doc, false, false, Some(&set)).unwrap();
        assert_eq!(
            String::from_utf8(v10).unwrap(),
            r#"<b xml:id="x" xml:lang="es"></b>"#
        );
        let v11 = canonicalize(&doc, false, true, Some(&set)).unwrap();
        assert_eq!(String::from_utf8(v11).unwrap(), r#"<b xml:lang="es"></b>"#);
    }

    #[test]
    fn test_default_namespace_undeclared() {
        assert_eq!(
            c14n(r#"<a xmlns="http://d"><b xmlns=""/></a>"#),
            r#"<a xmlns="http://d"><b xmlns=""></b></a>"#
        );
    }
}
