#![forbid(unsafe_code)]

//! Parsing and lookup helpers over roxmltree documents.

use firma_core::{ns, Error};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode raw document bytes into text.
///
/// UTF-8 is tried first (a leading BOM is dropped). Anything else is decoded
/// with the encoding named in the XML declaration; Facturae files produced by
/// older tooling are frequently ISO-8859-1.
pub fn decode_text(data: &[u8]) -> Result<Cow<'_, str>, Error> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    match std::str::from_utf8(data) {
        Ok(text) => Ok(Cow::Borrowed(text)),
        Err(utf8_err) => {
            let label = declared_encoding(data)
                .ok_or_else(|| Error::XmlParse(format!("invalid UTF-8: {utf8_err}")))?;
            let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
                .ok_or_else(|| Error::XmlParse(format!("unknown encoding: {label}")))?;
            let (text, _, had_errors) = encoding.decode(data);
            if had_errors {
                return Err(Error::XmlParse(format!(
                    "document is not valid {}",
                    encoding.name()
                )));
            }
            Ok(Cow::Owned(text.into_owned()))
        }
    }
}

/// Read the `encoding` pseudo-attribute of the XML declaration, if any.
fn declared_encoding(data: &[u8]) -> Option<String> {
    if !data.starts_with(b"<?xml") {
        return None;
    }
    let end = data.windows(2).position(|w| w == b"?>")?;
    let decl = String::from_utf8_lossy(&data[..end]);
    let rest = &decl[decl.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    let close = value.find(quote)?;
    Some(value[..close].to_owned())
}

/// Parse text into a roxmltree document using [`crate::parsing_options`].
///
/// Documents nested deeper than [`crate::MAX_DEPTH`] are rejected before
/// parsing, since both the parser and canonicalization recurse per level.
pub fn parse(text: &str) -> Result<roxmltree::Document<'_>, Error> {
    check_depth(text.as_bytes(), crate::MAX_DEPTH)?;
    roxmltree::Document::parse_with_options(text, crate::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))
}

/// Scan markup for element nesting deeper than `max`.
///
/// Comments, CDATA sections, processing instructions and quoted attribute
/// values are skipped. Well-formedness is left to the parser.
fn check_depth(data: &[u8], max: usize) -> Result<(), Error> {
    let mut depth = 0usize;
    let mut i = 0;
    while let Some(offset) = data[i..].iter().position(|&b| b == b'<') {
        i += offset;
        let rest = &data[i..];
        if rest.starts_with(b"<!--") {
            i += skip_past(rest, b"-->");
        } else if rest.starts_with(b"<![CDATA[") {
            i += skip_past(rest, b"]]>");
        } else if rest.starts_with(b"<?") {
            i += skip_past(rest, b"?>");
        } else if rest.starts_with(b"<!") {
            i += skip_past(rest, b">");
        } else if rest.starts_with(b"</") {
            depth = depth.saturating_sub(1);
            i += skip_past(rest, b">");
        } else {
            let (len, self_closing) = start_tag_len(rest);
            if !self_closing {
                depth += 1;
                if depth > max {
                    return Err(Error::XmlParse(format!(
                        "nesting too deep (more than {max} levels)"
                    )));
                }
            }
            i += len;
        }
    }
    Ok(())
}

/// Bytes up to and including the first `end`, or the whole slice.
fn skip_past(data: &[u8], end: &[u8]) -> usize {
    data.windows(end.len())
        .position(|w| w == end)
        .map_or(data.len(), |pos| pos + end.len())
}

/// Length of a start tag and whether it closes itself.
fn start_tag_len(data: &[u8]) -> (usize, bool) {
    let mut quote = None;
    for (pos, &b) in data.iter().enumerate().skip(1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return (pos + 1, data[pos - 1] == b'/'),
            None => {}
        }
    }
    (data.len(), false)
}

fn is_named(node: &roxmltree::Node<'_, '_>, ns_uri: &str, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node.tag_name().namespace().unwrap_or("") == ns_uri
}

/// Find the first element (document order, root included) with the given name.
pub fn find_element<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    ns_uri: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    doc.descendants().find(|n| is_named(n, ns_uri, local_name))
}

/// Find the first proper descendant of `node` with the given name.
pub fn find_descendant<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .find(|n| is_named(n, ns_uri, local_name))
}

/// Find the first child element of `parent` with the given name.
pub fn find_child_element<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    parent.children().find(|n| is_named(n, ns_uri, local_name))
}

/// Find all child elements of `parent` with the given name.
pub fn find_child_elements<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Vec<roxmltree::Node<'a, 'input>> {
    parent
        .children()
        .filter(|n| is_named(n, ns_uri, local_name))
        .collect()
}

/// Concatenated text content of an element and its descendants.
pub fn element_text(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Build the ID → NodeId map from the `Id`, `ID` and `id` attributes.
pub fn build_id_map(doc: &roxmltree::Document<'_>) -> HashMap<String, roxmltree::NodeId> {
    let mut map = HashMap::new();
    for node in doc.descendants().filter(|n| n.is_element()) {
        for attr_name in ns::attr::ID_ATTRS {
            if let Some(val) = node.attribute(attr_name) {
                map.insert(val.to_owned(), node.id());
            }
        }
    }
    map
}

/// The element's qualified name exactly as written in the source text.
///
/// roxmltree resolves prefixes away, but canonical XML must reproduce them,
/// so the name is read back from the start tag.
pub fn qualified_name<'input>(node: roxmltree::Node<'_, 'input>) -> &'input str {
    let text = node.document().input_text();
    let rest = text.get(node.range().start + 1..).unwrap_or("");
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(rest.len());
    let qname = &rest[..end];
    if qname.ends_with(node.tag_name().name()) {
        qname
    } else {
        node.tag_name().name()
    }
}

/// The prefix of the element's qualified name, or "" when unprefixed.
pub fn element_prefix<'input>(node: roxmltree::Node<'_, 'input>) -> &'input str {
    qualified_name(node)
        .split_once(':')
        .map_or("", |(prefix, _)| prefix)
}

/// The prefix of a namespaced attribute as written in the source text, or
/// `None` when the attribute has no namespace.
///
/// Several prefixes may bind the same URI, so the prefix is read back from the
/// attribute itself. The first declaration for the URI is the fallback.
pub fn attribute_prefix(
    node: roxmltree::Node<'_, '_>,
    attr: &roxmltree::Attribute<'_, '_>,
) -> Option<String> {
    let ns_uri = attr.namespace()?;
    if ns_uri == ns::XML {
        return Some("xml".to_owned());
    }
    let written = node
        .document()
        .input_text()
        .get(attr.range().start..)
        .and_then(|rest| rest.split(|c: char| c == '=' || c.is_whitespace()).next())
        .and_then(|qname| qname.strip_suffix(attr.name()))
        .and_then(|prefix| prefix.strip_suffix(':'))
        .filter(|prefix| !prefix.is_empty());
    if let Some(prefix) = written {
        return Some(prefix.to_owned());
    }
    node.namespaces()
        .find(|decl| decl.uri() == ns_uri && decl.name().is_some())
        .and_then(|decl| decl.name())
        .map(|p| p.to_owned())
}

/// Namespace bindings in scope at `node`, keyed by prefix ("" for the default).
///
/// The implicit `xml` binding and default-namespace undeclarations are left out.
pub fn inscope_namespaces(node: roxmltree::Node<'_, '_>) -> BTreeMap<String, String> {
    node.namespaces()
        .filter(|decl| decl.name() != Some("xml") && !decl.uri().is_empty())
        .map(|decl| (decl.name().unwrap_or("").to_owned(), decl.uri().to_owned()))
        .collect()
}
