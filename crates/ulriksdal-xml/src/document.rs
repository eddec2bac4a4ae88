#![forbid(unsafe_code)]

//! XML document wrapper over roxmltree with ID attribute registration and
//! byte-range editing.

use std::collections::HashMap;
use std::ops::Range;
use ulriksdal_core::Error;

/// Attribute names treated as XML IDs on every element.
const DEFAULT_ID_ATTRS: [&str; 3] = ["ID", "Id", "id"];

/// An owned XML document.  Stores the text and the ID attribute names.
///
/// To work with the parsed tree, call [`XmlDocument::parse_doc`] which
/// returns a temporary `roxmltree::Document` borrowing from the text.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    text: String,
    /// Additional ID attribute names to register (beyond `ID`, `Id`, `id`).
    extra_id_attrs: Vec<String>,
}

impl XmlDocument {
    /// Parse and validate XML from a string, taking ownership.
    pub fn parse(text: String) -> Result<Self, Error> {
        crate::parse(&text)?;
        Ok(Self {
            text,
            extra_id_attrs: Vec::new(),
        })
    }

    /// Get the raw XML text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consume the document and return its text.
    pub fn into_text(self) -> String {
        self.text
    }

    /// Register an additional ID attribute name.
    pub fn add_id_attr(&mut self, name: &str) {
        if !self.extra_id_attrs.iter().any(|a| a == name) {
            self.extra_id_attrs.push(name.to_owned());
        }
    }

    /// Parse the document and return a temporary `roxmltree::Document`.
    pub fn parse_doc(&self) -> Result<roxmltree::Document<'_>, Error> {
        crate::parse(&self.text)
    }

    /// Build the ID → NodeId mapping for a parsed document.
    ///
    /// An ID value carried by two different elements makes every
    /// same-document reference to it ambiguous, so it is rejected.
    pub fn build_id_map(
        &self,
        doc: &roxmltree::Document<'_>,
    ) -> Result<HashMap<String, roxmltree::NodeId>, Error> {
        let mut map: HashMap<String, roxmltree::NodeId> = HashMap::new();
        let names = DEFAULT_ID_ATTRS
            .iter()
            .copied()
            .chain(self.extra_id_attrs.iter().map(String::as_str));
        let names: Vec<&str> = names.collect();

        for node in doc.descendants().filter(|n| n.is_element()) {
            for name in &names {
                let Some(value) = node.attribute(*name) else {
                    continue;
                };
                match map.get(value) {
                    Some(existing) if *existing != node.id() => {
                        return Err(Error::XmlStructure(format!("duplicate ID value: {value}")));
                    }
                    Some(_) => {}
                    None => {
                        map.insert(value.to_owned(), node.id());
                    }
                }
            }
        }
        Ok(map)
    }

    /// Find all descendant elements with the given local name and namespace.
    pub fn find_elements<'a, 'input>(
        doc: &'a roxmltree::Document<'input>,
        ns: &str,
        local_name: &str,
    ) -> Vec<roxmltree::Node<'a, 'input>> {
        doc.descendants()
            .filter(|n| is_named(*n, ns, local_name))
            .collect()
    }

    /// Apply a batch of text edits and re-validate the result.
    ///
    /// Edits are expressed against the current text; they must not overlap.
    pub fn apply(self, mut edits: Vec<TextEdit>) -> Result<Self, Error> {
        edits.sort_by_key(|e| (e.range.start, e.range.end));
        for pair in edits.windows(2) {
            if pair[0].range.end > pair[1].range.start {
                return Err(Error::XmlStructure("overlapping text edits".into()));
            }
        }

        let mut text = self.text;
        for edit in edits.into_iter().rev() {
            if edit.range.end > text.len() || !text.is_char_boundary(edit.range.start) {
                return Err(Error::XmlStructure("text edit out of bounds".into()));
            }
            text.replace_range(edit.range, &edit.replacement);
        }

        let mut doc = Self::parse(text)?;
        doc.extra_id_attrs = self.extra_id_attrs;
        Ok(doc)
    }
}

/// Check whether `node` is an element with the given namespace and local name.
pub fn is_named(node: roxmltree::Node<'_, '_>, ns: &str, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node.tag_name().namespace().unwrap_or("") == ns
}

/// A replacement of a byte range of the document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    range: Range<usize>,
    replacement: String,
}

impl TextEdit {
    /// Insert `markup` directly after the end of `node`, with nothing in between.
    pub fn insert_after(node: roxmltree::Node<'_, '_>, markup: impl Into<String>) -> Self {
        let end = node.range().end;
        Self {
            range: end..end,
            replacement: markup.into(),
        }
    }

    /// Replace the whole content of element `node` with escaped `text`.
    ///
    /// Handles both `<x/>` and `<x>...</x>` forms.
    pub fn set_text(node: roxmltree::Node<'_, '_>, text: &str) -> Result<Self, Error> {
        if !node.is_element() {
            return Err(Error::XmlStructure("text can only be set on elements".into()));
        }
        let escaped = crate::writer::escape_text(text);
        let range = node.range();
        let markup = &node.document().input_text()[range.clone()];

        if let (Some(first), Some(last)) = (node.first_child(), node.last_child()) {
            return Ok(Self {
                range: first.range().start..last.range().end,
                replacement: escaped,
            });
        }

        if markup.ends_with("/>") {
            let qname = crate::element_qname(node);
            return Ok(Self {
                range: range.end - 2..range.end,
                replacement: format!(">{escaped}</{qname}>"),
            });
        }

        let close = markup
            .rfind("</")
            .ok_or_else(|| Error::XmlStructure("element has no closing tag".into()))?;
        let at = range.start + close;
        Ok(Self {
            range: at..at,
            replacement: escaped,
        })
    }
}
