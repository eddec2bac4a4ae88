#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N).
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//! With comments: `http://www.w3.org/2001/10/xml-exc-c14n#WithComments`
//!
//! Only "visibly utilized" namespace declarations are output.  A namespace
//! is visibly utilized by an element if:
//! 1. Its prefix is used by the element's tag name, OR
//! 2. Its prefix is used by one of the element's attributes, OR
//! 3. The prefix appears in the InclusiveNamespaces PrefixList.
//!
//! A declaration is emitted only when the nearest output ancestor did not
//! already render the same binding.

use crate::escape;
use crate::render::{Attr, NsDecl};
use roxmltree::{Document, Node, NodeType};
use std::collections::{BTreeMap, BTreeSet};
use ulriksdal_core::{ns, Error};
use ulriksdal_xml::NodeSet;

/// Canonicalize using Exclusive C14N 1.0.
pub fn canonicalize(
    doc: &Document<'_>,
    with_comments: bool,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    let inclusive: BTreeSet<String> = inclusive_prefixes
        .iter()
        .map(|p| if p == "#default" { String::new() } else { p.clone() })
        .collect();
    let ctx = ExcC14nContext {
        with_comments,
        node_set,
        inclusive,
    };
    let mut output = Vec::new();
    ctx.process_node(doc.root(), &mut output, &BTreeMap::new())?;
    Ok(output)
}

struct ExcC14nContext<'a> {
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
    /// PrefixList entries, with `#default` mapped to "".
    inclusive: BTreeSet<String>,
}

impl ExcC14nContext<'_> {
    fn is_visible(&self, node: Node<'_, '_>) -> bool {
        self.node_set.map_or(true, |set| set.contains(node.id()))
    }

    fn process_node(
        &self,
        node: Node<'_, '_>,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        match node.node_type() {
            NodeType::Root => {
                for child in node.children() {
                    self.process_node(child, output, rendered_ns)?;
                }
            }
            NodeType::Element => self.process_element(node, output, rendered_ns)?,
            NodeType::Text => {
                if self.is_visible(node) {
                    escape::text_into(node.text().unwrap_or(""), output);
                }
            }
            NodeType::Comment => {
                if self.with_comments && self.is_visible(node) {
                    wrap_top_level(node, output, |out| {
                        out.extend_from_slice(b"<!--");
                        out.extend_from_slice(node.text().unwrap_or("").as_bytes());
                        out.extend_from_slice(b"-->");
                    });
                }
            }
            NodeType::PI => {
                if let (true, Some(pi)) = (self.is_visible(node), node.pi()) {
                    wrap_top_level(node, output, |out| {
                        out.extend_from_slice(b"<?");
                        out.extend_from_slice(pi.target.as_bytes());
                        if let Some(value) = pi.value.filter(|v| !v.is_empty()) {
                            out.push(b' ');
                            escape::pi_into(value, out);
                        }
                        out.extend_from_slice(b"?>");
                    });
                }
            }
        }
        Ok(())
    }

    fn process_element(
        &self,
        node: Node<'_, '_>,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        if !self.is_visible(node) {
            // Namespace declarations only appear on output start tags, so an
            // omitted element passes its ancestor's rendering context through.
            for child in node.children() {
                self.process_node(child, output, rendered_ns)?;
            }
            return Ok(());
        }

        let elem_prefix = ulriksdal_xml::element_prefix(node);
        let mut utilized: BTreeSet<&str> = BTreeSet::new();
        utilized.insert(elem_prefix);

        let mut attrs: Vec<Attr> = Vec::new();
        for attr in node.attributes() {
            let prefix = ulriksdal_xml::attribute_prefix(node, &attr);
            let qualified_name = match prefix {
                Some(p) => {
                    if p != "xml" {
                        utilized.insert(p);
                    }
                    format!("{p}:{}", attr.name())
                }
                None if attr.namespace().is_some() => {
                    return Err(Error::Canonicalization(format!(
                        "no prefix in scope for attribute {{{}}}{}",
                        attr.namespace().unwrap_or(""),
                        attr.name()
                    )));
                }
                None => attr.name().to_owned(),
            };
            attrs.push(Attr {
                ns_uri: attr.namespace().unwrap_or("").to_owned(),
                local_name: attr.name().to_owned(),
                qualified_name,
                value: attr.value().to_owned(),
            });
        }
        attrs.sort();

        for p in &self.inclusive {
            utilized.insert(p.as_str());
        }

        let inscope = inscope_namespaces(node);
        let mut ns_decls: Vec<NsDecl> = Vec::new();
        for prefix in utilized {
            match inscope.get(prefix) {
                Some(uri) => {
                    if rendered_ns.get(prefix).map(String::as_str) != Some(*uri) {
                        ns_decls.push(NsDecl {
                            prefix: prefix.to_owned(),
                            uri: (*uri).to_owned(),
                        });
                    }
                }
                None if prefix.is_empty() => {
                    // The element has no default namespace but an output
                    // ancestor rendered one: undeclare it.
                    if rendered_ns.get("").is_some_and(|uri| !uri.is_empty()) {
                        ns_decls.push(NsDecl {
                            prefix: String::new(),
                            uri: String::new(),
                        });
                    }
                }
                None => {
                    if prefix == elem_prefix {
                        return Err(Error::Canonicalization(format!(
                            "undeclared prefix on element: {prefix}"
                        )));
                    }
                    // A PrefixList entry that is not in scope is ignored.
                }
            }
        }
        ns_decls.sort();

        let elem_name = ulriksdal_xml::element_qname(node);
        output.push(b'<');
        output.extend_from_slice(elem_name.as_bytes());
        for decl in &ns_decls {
            decl.write_to(output);
        }
        for attr in &attrs {
            attr.write_to(output);
        }
        output.push(b'>');

        let child_rendered;
        let rendered_for_children = if ns_decls.is_empty() {
            rendered_ns
        } else {
            let mut map = rendered_ns.clone();
            for decl in ns_decls {
                map.insert(decl.prefix, decl.uri);
            }
            child_rendered = map;
            &child_rendered
        };

        for child in node.children() {
            self.process_node(child, output, rendered_for_children)?;
        }

        output.extend_from_slice(b"</");
        output.extend_from_slice(elem_name.as_bytes());
        output.push(b'>');
        Ok(())
    }
}

/// In-scope namespace bindings of `node`, keyed by prefix ("" for default).
/// The implicit `xml` binding and default-namespace undeclarations are left
/// out.
fn inscope_namespaces<'a>(node: Node<'a, '_>) -> BTreeMap<&'a str, &'a str> {
    node.namespaces()
        .filter(|n| n.uri() != ns::XML && !n.uri().is_empty())
        .map(|n| (n.name().unwrap_or(""), n.uri()))
        .collect()
}

/// Comments and PIs outside the document element are separated from it by
/// a line feed.
fn wrap_top_level(node: Node<'_, '_>, output: &mut Vec<u8>, write: impl FnOnce(&mut Vec<u8>)) {
    let top_level = node
        .parent()
        .is_some_and(|p| p.node_type() == NodeType::Root);
    if top_level && node.prev_siblings().skip(1).any(|s| s.is_element()) {
        output.push(b'\n');
    }
    write(output);
    if top_level && node.next_siblings().skip(1).any(|s| s.is_element()) {
        output.push(b'\n');
    }
}
