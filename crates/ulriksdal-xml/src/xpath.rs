#![forbid(unsafe_code)]

//! Minimal XPath subset for XML-DSig and SAML processing.
//!
//! Supports only what the signing pipeline needs:
//! - Same-document URI references: `#id-value`
//! - `id('...')` resolution through a pre-built ID map
//! - Namespace-qualified child-axis location paths such as
//!   `/saml2p:Response/saml2:Assertion`, with prefixes bound by an
//!   [`NsContext`] rather than by the document

use std::collections::HashMap;
use ulriksdal_core::Error;

/// Parse a same-document reference (e.g., `#foo` → `foo`).
pub fn parse_same_document_ref(uri: &str) -> Option<&str> {
    uri.strip_prefix('#')
}

/// Resolve an ID value in a parsed document using a pre-built ID map.
pub fn resolve_id<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    id_map: &HashMap<String, roxmltree::NodeId>,
    id: &str,
) -> Result<roxmltree::Node<'a, 'input>, Error> {
    id_map
        .get(id)
        .and_then(|nid| doc.get_node(*nid))
        .ok_or_else(|| Error::InvalidUri(format!("ID not found: {id}")))
}

/// Prefix → namespace bindings used to evaluate location paths.
#[derive(Debug, Clone, Default)]
pub struct NsContext {
    bindings: HashMap<String, String>,
}

impl NsContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix` to `uri`, replacing any earlier binding.
    pub fn bind(mut self, prefix: &str, uri: &str) -> Self {
        self.bindings.insert(prefix.to_owned(), uri.to_owned());
        self
    }

    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }
}

/// One step of a location path: a namespace URI (empty for none) and a
/// local name, or `*` for any element.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    ns: String,
    local: String,
}

impl Step {
    fn matches(&self, node: roxmltree::Node<'_, '_>) -> bool {
        if !node.is_element() {
            return false;
        }
        if self.local == "*" {
            return true;
        }
        node.tag_name().name() == self.local
            && node.tag_name().namespace().unwrap_or("") == self.ns
    }
}

fn compile(path: &str, ns: &NsContext) -> Result<(bool, Vec<Step>), Error> {
    let absolute = path.starts_with('/');
    let body = path.trim_start_matches('/');
    if body.is_empty() {
        return Err(Error::XmlStructure(format!("empty location path: {path:?}")));
    }

    let mut steps = Vec::new();
    for raw in body.split('/') {
        let step = match raw.split_once(':') {
            Some((prefix, local)) => {
                let uri = ns.resolve(prefix).ok_or_else(|| {
                    Error::XmlStructure(format!("unbound prefix in location path: {prefix}"))
                })?;
                Step {
                    ns: uri.to_owned(),
                    local: local.to_owned(),
                }
            }
            None => Step {
                ns: String::new(),
                local: raw.to_owned(),
            },
        };
        if step.local.is_empty() {
            return Err(Error::XmlStructure(format!("empty step in location path: {path:?}")));
        }
        steps.push(step);
    }
    Ok((absolute, steps))
}

/// Select every element reached by following `path` along the child axis.
///
/// An absolute path starts at the document root (so its first step names
/// the document element); a relative path starts at `context`.
pub fn select<'a, 'input>(
    context: roxmltree::Node<'a, 'input>,
    path: &str,
    ns: &NsContext,
) -> Result<Vec<roxmltree::Node<'a, 'input>>, Error> {
    let (absolute, steps) = compile(path, ns)?;
    let start = if absolute {
        context.document().root()
    } else {
        context
    };

    let mut current = vec![start];
    for step in &steps {
        current = current
            .iter()
            .flat_map(|n| n.children())
            .filter(|n| step.matches(*n))
            .collect();
        if current.is_empty() {
            break;
        }
    }
    Ok(current)
}

/// Select the first element reached by `path`, if any.
pub fn select_single<'a, 'input>(
    context: roxmltree::Node<'a, 'input>,
    path: &str,
    ns: &NsContext,
) -> Result<Option<roxmltree::Node<'a, 'input>>, Error> {
    Ok(select(context, path, ns)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<p:Response xmlns:p="urn:proto" xmlns:a="urn:assert">
  <a:Issuer>outer</a:Issuer>
  <a:Assertion ID="_a1"><a:Issuer>inner</a:Issuer></a:Assertion>
</p:Response>"#;

    fn ctx() -> NsContext {
        // Prefixes deliberately differ from the document's.
        NsContext::new()
            .bind("samlp", "urn:proto")
            .bind("saml", "urn:assert")
    }

    #[test]
    fn absolute_path_selects_by_namespace() {
        let doc = crate::parse(DOC).unwrap();
        let assertion = select_single(doc.root(), "/samlp:Response/saml:Assertion", &ctx())
            .unwrap()
            .unwrap();
        assert_eq!(assertion.attribute("ID"), Some("_a1"));

        let issuer = select_single(assertion, "saml:Issuer", &ctx()).unwrap().unwrap();
        assert_eq!(issuer.text(), Some("inner"));
    }

    #[test]
    fn wrong_namespace_selects_nothing() {
        let doc = crate::parse(DOC).unwrap();
        let other = NsContext::new()
            .bind("samlp", "urn:proto")
            .bind("saml", "urn:other");
        let found = select_single(doc.root(), "/samlp:Response/saml:Assertion", &other).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn unbound_prefix_is_an_error() {
        let doc = crate::parse(DOC).unwrap();
        assert!(select(doc.root(), "/x:Response", &ctx()).is_err());
    }

    #[test]
    fn resolves_same_document_refs() {
        assert_eq!(parse_same_document_ref("#_a1"), Some("_a1"));
        assert_eq!(parse_same_document_ref("_a1"), None);

        let doc = crate::parse(DOC).unwrap();
        let xml = crate::XmlDocument::parse(DOC.into()).unwrap();
        let map = xml.build_id_map(&doc).unwrap();
        let node = resolve_id(&doc, &map, "_a1").unwrap();
        assert_eq!(node.tag_name().name(), "Assertion");
        assert!(resolve_id(&doc, &map, "_missing").is_err());
    }
}
