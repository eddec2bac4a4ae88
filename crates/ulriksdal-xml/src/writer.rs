#![forbid(unsafe_code)]

//! Element-tree construction and serialization.
//!
//! Documents are built as an owned tree of [`Element`] values and written
//! out by an [`XmlWriter`], either compact or indented.  Indentation is only
//! applied between element children; text content is never reflowed.

use std::fmt;

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its qualified name, attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an element with the given qualified name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute. Attributes are written in insertion order.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Declare a namespace: `xmlns:prefix` or, with `None`, the default.
    pub fn ns(self, prefix: Option<&str>, uri: &str) -> Self {
        match prefix {
            Some(p) => self.attr(format!("xmlns:{p}"), uri),
            None => self.attr("xmlns", uri),
        }
    }

    /// Append a child element.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Append a child element if one is given.
    pub fn child_opt(self, child: Option<Element>) -> Self {
        match child {
            Some(c) => self.child(c),
            None => self,
        }
    }

    /// Append every element yielded by `children`.
    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children
            .extend(children.into_iter().map(Node::Element));
        self
    }

    /// Append a text node.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// The first child element with the given qualified name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.name == name)
    }

    /// Concatenated text of the direct text children.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    fn has_element_children(&self) -> bool {
        self.children.iter().any(|c| matches!(c, Node::Element(_)))
    }

    fn has_text_children(&self) -> bool {
        self.children.iter().any(|c| matches!(c, Node::Text(_)))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&XmlWriter::compact().write(self))
    }
}

/// Serializes an [`Element`] tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlWriter {
    indent: Option<usize>,
}

impl XmlWriter {
    /// No whitespace between elements.
    pub fn compact() -> Self {
        Self { indent: None }
    }

    /// One element per line, nested `width` spaces per level.
    pub fn pretty(width: usize) -> Self {
        Self {
            indent: Some(width),
        }
    }

    /// Write `root` and return the document text.
    pub fn write(&self, root: &Element) -> String {
        let mut out = String::new();
        self.write_element(root, 0, &mut out);
        out
    }

    fn write_element(&self, el: &Element, depth: usize, out: &mut String) {
        out.push('<');
        out.push_str(&el.name);
        for (name, value) in &el.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }

        if el.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');

        // Mixed content is written as-is; only element-only content is indented.
        let indent = match self.indent {
            Some(width) if el.has_element_children() && !el.has_text_children() => Some(width),
            _ => None,
        };

        for child in &el.children {
            match child {
                Node::Element(c) => match indent {
                    Some(width) => {
                        out.push('\n');
                        push_spaces(out, width * (depth + 1));
                        self.write_element(c, depth + 1, out);
                    }
                    None => XmlWriter::compact().write_element(c, depth, out),
                },
                Node::Text(t) => out.push_str(&escape_text(t)),
            }
        }

        if let Some(width) = indent {
            out.push('\n');
            push_spaces(out, width * depth);
        }
        out.push_str("</");
        out.push_str(&el.name);
        out.push('>');
    }
}

fn push_spaces(out: &mut String, n: usize) {
    out.extend(std::iter::repeat(' ').take(n));
}

/// Escape character data for element content.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape an attribute value for a double-quoted attribute.
fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
    out
}
