#![forbid(unsafe_code)]

//! XML document abstraction for ulriksdal.
//!
//! Provides an owned document over `roxmltree`, the `NodeSet` used by
//! canonicalization and transforms, byte-range text edits for splicing
//! signature material into an existing document, a namespace-aware path
//! lookup, and an element-tree writer for building documents.

pub mod document;
pub mod nodeset;
pub mod writer;
pub mod xpath;

pub use document::{TextEdit, XmlDocument};
pub use nodeset::NodeSet;
pub use writer::{Element, XmlWriter};
pub use xpath::NsContext;

/// Return the roxmltree parsing options used for every parse.
///
/// DTDs are rejected: SAML protocol messages never carry one.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: false,
        ..roxmltree::ParsingOptions::default()
    }
}

/// Parse `text` with [`parsing_options`], mapping failures to the core error.
pub fn parse(text: &str) -> Result<roxmltree::Document<'_>, ulriksdal_core::Error> {
    roxmltree::Document::parse_with_options(text, parsing_options())
        .map_err(|e| ulriksdal_core::Error::XmlParse(e.to_string()))
}

/// The qualified name (`prefix:local` or `local`) of an element as written
/// in the source text.
pub fn element_qname<'input>(node: roxmltree::Node<'_, 'input>) -> &'input str {
    let input = node.document().input_text();
    let start = node.range().start;
    let rest = input[start..].strip_prefix('<').unwrap_or(&input[start..]);
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(rest.len());
    &rest[..end]
}

/// The prefix of an element's tag name, or `""` when it is unprefixed.
pub fn element_prefix<'input>(node: roxmltree::Node<'_, 'input>) -> &'input str {
    element_qname(node)
        .split_once(':')
        .map(|(prefix, _)| prefix)
        .unwrap_or("")
}

/// The prefix of a namespaced attribute on `node`, as written in the source.
///
/// Returns `None` for attributes without a namespace. Two prefixes may be
/// bound to the same URI, so the prefix is read from the attribute's own
/// qualified name rather than looked up from its namespace.
pub fn attribute_prefix<'input>(
    node: roxmltree::Node<'_, 'input>,
    attr: &roxmltree::Attribute<'_, 'input>,
) -> Option<&'input str> {
    attr.namespace()?;
    let qname = &node.document().input_text()[attr.range_qname()];
    qname.split_once(':').map(|(prefix, _)| prefix)
}
