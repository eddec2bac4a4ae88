#![forbid(unsafe_code)]

//! XML-DSig signature verification.
//!
//! Processing order:
//! 1. Parse the document, register ID attributes
//! 2. Read `<SignedInfo>`: CanonicalizationMethod, SignatureMethod
//! 3. For each `<Reference>`: resolve URI, run transforms, compute digest, compare
//! 4. Resolve the verification key (supplied, or from `<KeyInfo>`)
//! 5. Canonicalize `<SignedInfo>`
//! 6. Verify `<SignatureValue>`

use base64::Engine;
use std::collections::HashMap;
use ulriksdal_c14n::C14nMode;
use ulriksdal_core::{ns, Error};
use ulriksdal_keys::Key;
use ulriksdal_transforms::{uri, TransformData, TransformPipeline};
use ulriksdal_xml::XmlDocument;

use crate::context::DsigContext;

/// Result of signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    /// Signature is valid.
    Valid,
    /// Signature is invalid.
    Invalid { reason: String },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid)
    }
}

/// Verify the signature of an XML document.
///
/// `key` is used when given; otherwise the certificate embedded in the
/// signature's `<ds:KeyInfo>` is.  Malformed signatures are errors, while a
/// well-formed signature that does not check out is `Ok(Invalid)`.
pub fn verify(ctx: &DsigContext, xml: &str, key: Option<&Key>) -> Result<VerifyResult, Error> {
    let mut document = XmlDocument::parse(xml.to_owned())?;
    for name in &ctx.id_attrs {
        document.add_id_attr(name);
    }
    let doc = document.parse_doc()?;
    let id_map = document.build_id_map(&doc)?;

    let sig_node = find_signature(&doc)?;
    let signed_info = required_child(sig_node, ns::node::SIGNED_INFO)?;
    let (c14n_mode, inclusive_prefixes) =
        read_c14n_method(required_child(signed_info, ns::node::CANONICALIZATION_METHOD)?)?;
    let sig_method_uri = algorithm_attr(required_child(signed_info, ns::node::SIGNATURE_METHOD)?)?;

    let references: Vec<_> = dsig_children(signed_info, ns::node::REFERENCE).collect();
    if references.is_empty() {
        return Err(Error::MissingElement("Reference".into()));
    }
    for reference in references {
        let computed = reference_digest(reference, &doc, &id_map, sig_node)?;
        let expected = decode_base64(required_child(reference, ns::node::DIGEST_VALUE)?)?;
        if computed != expected {
            let uri = reference.attribute(ns::attr::URI).unwrap_or("");
            tracing::debug!(uri, "reference digest mismatch");
            return Ok(VerifyResult::Invalid {
                reason: format!("digest mismatch for reference \"{uri}\""),
            });
        }
    }

    let embedded;
    let key = match key {
        Some(key) => key,
        None => {
            embedded = match child(sig_node, ns::node::KEY_INFO) {
                Some(key_info) => ulriksdal_keys::keyinfo::extract_key(key_info)?,
                None => None,
            };
            embedded.as_ref().ok_or_else(|| {
                Error::Key("no verification key supplied and KeyInfo has no certificate".into())
            })?
        }
    };

    let c14n_signed_info =
        ulriksdal_c14n::canonicalize_subtree(signed_info, c14n_mode, &inclusive_prefixes)?;
    tracing::trace!(
        signed_info = %String::from_utf8_lossy(&c14n_signed_info),
        "canonical SignedInfo"
    );

    let sig_value = decode_base64(required_child(sig_node, ns::node::SIGNATURE_VALUE)?)?;
    let sig_alg = ulriksdal_crypto::sign::from_uri(sig_method_uri)?;
    if sig_alg.verify(&key.to_verification_key(), &c14n_signed_info, &sig_value)? {
        Ok(VerifyResult::Valid)
    } else {
        Ok(VerifyResult::Invalid {
            reason: "signature value verification failed".into(),
        })
    }
}

/// Compute the digest of one `<Reference>`: resolve its URI, run its
/// transforms and hash the resulting octets with its DigestMethod.
pub(crate) fn reference_digest(
    reference: roxmltree::Node<'_, '_>,
    doc: &roxmltree::Document<'_>,
    id_map: &HashMap<String, roxmltree::NodeId>,
    sig_node: roxmltree::Node<'_, '_>,
) -> Result<Vec<u8>, Error> {
    let ref_uri = reference.attribute(ns::attr::URI).unwrap_or("");
    let digest_uri = algorithm_attr(required_child(reference, ns::node::DIGEST_METHOD)?)?;

    let mut pipeline = TransformPipeline::new();
    if let Some(transforms) = child(reference, ns::node::TRANSFORMS) {
        for transform in dsig_children(transforms, ns::node::TRANSFORM) {
            pipeline.push(ulriksdal_transforms::from_uri(
                algorithm_attr(transform)?,
                sig_node.id(),
                read_inclusive_prefixes(transform),
            )?);
        }
    }

    let node_set = uri::resolve_uri(ref_uri, doc, id_map)?;
    let octets = pipeline
        .execute(TransformData::Xml { doc, node_set })?
        .into_binary()?;
    tracing::trace!(
        uri = ref_uri,
        octets = %String::from_utf8_lossy(&octets),
        "pre-digest data"
    );

    let digest = ulriksdal_crypto::digest::digest(digest_uri, &octets)?;
    tracing::debug!(
        uri = ref_uri,
        transforms = ?pipeline.uris(),
        length = octets.len(),
        "reference digested"
    );
    Ok(digest)
}

/// The single `<ds:Signature>` of a document.
pub(crate) fn find_signature<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
) -> Result<roxmltree::Node<'a, 'input>, Error> {
    let mut signatures = XmlDocument::find_elements(doc, ns::DSIG, ns::node::SIGNATURE).into_iter();
    let first = signatures
        .next()
        .ok_or_else(|| Error::MissingElement("Signature".into()))?;
    if signatures.next().is_some() {
        return Err(Error::XmlStructure("more than one Signature element".into()));
    }
    Ok(first)
}

/// Read the mode and PrefixList of a canonicalization method element.
pub(crate) fn read_c14n_method(node: roxmltree::Node<'_, '_>) -> Result<(C14nMode, Vec<String>), Error> {
    let uri = algorithm_attr(node)?;
    let mode = C14nMode::from_uri(uri)
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("C14N: {uri}")))?;
    Ok((mode, read_inclusive_prefixes(node)))
}

pub(crate) fn algorithm_attr<'a>(node: roxmltree::Node<'a, '_>) -> Result<&'a str, Error> {
    node.attribute(ns::attr::ALGORITHM).ok_or_else(|| {
        Error::MissingAttribute(format!("Algorithm on {}", node.tag_name().name()))
    })
}

pub(crate) fn child<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    local_name: &'static str,
) -> Option<roxmltree::Node<'a, 'input>> {
    dsig_children(parent, local_name).next()
}

pub(crate) fn required_child<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    local_name: &'static str,
) -> Result<roxmltree::Node<'a, 'input>, Error> {
    child(parent, local_name).ok_or_else(|| Error::MissingElement(local_name.into()))
}

fn dsig_children<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    local_name: &'static str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
    parent
        .children()
        .filter(move |c| ulriksdal_xml::document::is_named(*c, ns::DSIG, local_name))
}

fn read_inclusive_prefixes(node: roxmltree::Node<'_, '_>) -> Vec<String> {
    node.children()
        .find(|c| {
            c.is_element()
                && c.tag_name().name() == ns::node::INCLUSIVE_NAMESPACES
                && c.tag_name().namespace() == Some(ns::EXC_C14N)
        })
        .and_then(|c| c.attribute(ns::attr::PREFIX_LIST))
        .map(|list| list.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

fn decode_base64(node: roxmltree::Node<'_, '_>) -> Result<Vec<u8>, Error> {
    let clean: String = node
        .text()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    base64::engine::general_purpose::STANDARD
        .decode(clean)
        .map_err(|e| Error::Base64(format!("{}: {e}", node.tag_name().name())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inclusive_prefixes_are_read() {
        let xml = format!(
            r#"<ds:Transform xmlns:ds="{}" Algorithm="{}"><ec:InclusiveNamespaces xmlns:ec="{}" PrefixList="xs  saml2 "/></ds:Transform>"#,
            ns::DSIG,
            ns::EXC_C14N,
            ns::EXC_C14N
        );
        let doc = ulriksdal_xml::parse(&xml).unwrap();
        let (mode, prefixes) = read_c14n_method(doc.root_element()).unwrap();
        assert_eq!(mode, C14nMode::Exclusive);
        assert_eq!(prefixes, vec!["xs".to_owned(), "saml2".to_owned()]);
    }

    #[test]
    fn missing_signature_is_an_error() {
        let err = verify(&DsigContext::default(), "<a ID=\"x\"/>", None).unwrap_err();
        assert!(matches!(err, Error::MissingElement(_)));
    }

    #[test]
    fn two_signatures_are_rejected() {
        let xml = format!(
            r#"<r xmlns:ds="{0}"><ds:Signature/><a><ds:Signature/></a></r>"#,
            ns::DSIG
        );
        let doc = ulriksdal_xml::parse(&xml).unwrap();
        assert!(matches!(find_signature(&doc), Err(Error::XmlStructure(_))));
    }
}
