#![forbid(unsafe_code)]

//! Namespace declarations and attributes in canonical order.

use crate::escape;
use std::cmp::Ordering;

/// A namespace declaration to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsDecl {
    /// The prefix ("" for default namespace).
    pub prefix: String,
    /// The namespace URI ("" to undeclare the default namespace).
    pub uri: String,
}

impl NsDecl {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b" xmlns");
        if !self.prefix.is_empty() {
            out.push(b':');
            out.extend_from_slice(self.prefix.as_bytes());
        }
        out.extend_from_slice(b"=\"");
        escape::attr_into(&self.uri, out);
        out.push(b'"');
    }
}

// Lexicographic by prefix; the default namespace has the empty prefix and
// therefore sorts first.
impl Ord for NsDecl {
    fn cmp(&self, other: &Self) -> Ordering {
        self.prefix.cmp(&other.prefix)
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
    /// Namespace URI, "" when the attribute has none.
    pub ns_uri: String,
    pub local_name: String,
    /// The name as written: `prefix:local` or `local`.
    pub qualified_name: String,
    pub value: String,
}

impl Attr {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(b' ');
        out.extend_from_slice(self.qualified_name.as_bytes());
        out.extend_from_slice(b"=\"");
        escape::attr_into(&self.value, out);
        out.push(b'"');
    }
}

// Namespace URI is the primary key and local name the secondary key;
// attributes without a namespace have the empty URI and sort first.
impl Ord for Attr {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.ns_uri, &self.local_name).cmp(&(&other.ns_uri, &other.local_name))
    }
}

impl PartialOrd for Attr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(ns: &str, local: &str, qname: &str) -> Attr {
        Attr {
            ns_uri: ns.into(),
            local_name: local.into(),
            qualified_name: qname.into(),
            value: String::new(),
        }
    }

    #[test]
    fn unqualified_attributes_sort_first() {
        let mut attrs = vec![
            attr("urn:b", "a", "b:a"),
            attr("", "z", "z"),
            attr("urn:a", "z", "x:z"),
            attr("", "b", "b"),
        ];
        attrs.sort();
        let names: Vec<_> = attrs.iter().map(|a| a.qualified_name.as_str()).collect();
        assert_eq!(names, ["b", "z", "x:z", "b:a"]);
    }

    #[test]
    fn default_namespace_sorts_first() {
        let mut decls = vec![
            NsDecl { prefix: "saml2".into(), uri: "urn:a".into() },
            NsDecl { prefix: String::new(), uri: "urn:d".into() },
            NsDecl { prefix: "ds".into(), uri: "urn:ds".into() },
        ];
        decls.sort();
        let mut out = Vec::new();
        for d in &decls {
            d.write_to(&mut out);
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#" xmlns="urn:d" xmlns:ds="urn:ds" xmlns:saml2="urn:a""#
        );
    }
}
