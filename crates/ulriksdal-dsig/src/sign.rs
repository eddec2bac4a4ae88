#![forbid(unsafe_code)]

//! XML-DSig signature creation.
//!
//! Template-based signing: the document already contains a `<ds:Signature>`
//! with empty `DigestValue` and `SignatureValue` elements (see
//! [`crate::template`]).  This module:
//! 1. Computes the digest of each `<Reference>` and writes it
//! 2. Re-parses, canonicalizes `<SignedInfo>`
//! 3. Computes the signature and writes it into `<SignatureValue>`
//!
//! Values are written with byte-range edits, so everything outside the two
//! filled elements is shipped exactly as it was digested.

use base64::Engine;
use ulriksdal_core::{ns, Error};
use ulriksdal_keys::Key;
use ulriksdal_xml::{TextEdit, XmlDocument};

use crate::context::DsigContext;
use crate::verify::{
    algorithm_attr, find_signature, read_c14n_method, reference_digest, required_child,
};

/// Sign a document containing a signature template with `key`.
///
/// Returns the document text with every DigestValue and the SignatureValue
/// filled in.  `key` must carry a private part.
pub fn sign(ctx: &DsigContext, key: &Key, template_xml: &str) -> Result<String, Error> {
    if !key.has_private_key() {
        return Err(Error::Key(format!(
            "{} has no private part and cannot sign",
            key.algorithm_name()
        )));
    }
    if let Some(cert) = key.certificate() {
        ulriksdal_keys::x509::check_validity(cert, chrono::Utc::now())?;
    }

    let engine = base64::engine::general_purpose::STANDARD;

    let mut document = XmlDocument::parse(template_xml.to_owned())?;
    for name in &ctx.id_attrs {
        document.add_id_attr(name);
    }

    // 1. Reference digests
    let digest_edits = {
        let doc = document.parse_doc()?;
        let id_map = document.build_id_map(&doc)?;
        let sig_node = find_signature(&doc)?;
        let signed_info = required_child(sig_node, ns::node::SIGNED_INFO)?;

        let mut edits = Vec::new();
        for reference in signed_info
            .children()
            .filter(|c| ulriksdal_xml::document::is_named(*c, ns::DSIG, ns::node::REFERENCE))
        {
            let digest = reference_digest(reference, &doc, &id_map, sig_node)?;
            let digest_value = required_child(reference, ns::node::DIGEST_VALUE)?;
            edits.push(TextEdit::set_text(digest_value, &engine.encode(&digest))?);
        }
        if edits.is_empty() {
            return Err(Error::MissingElement("Reference".into()));
        }
        edits
    };
    let document = document.apply(digest_edits)?;

    // 2-3. Canonicalize SignedInfo and sign it
    let signature_edit = {
        let doc = document.parse_doc()?;
        let sig_node = find_signature(&doc)?;
        let signed_info = required_child(sig_node, ns::node::SIGNED_INFO)?;
        let (c14n_mode, inclusive_prefixes) =
            read_c14n_method(required_child(signed_info, ns::node::CANONICALIZATION_METHOD)?)?;
        let sig_method_uri =
            algorithm_attr(required_child(signed_info, ns::node::SIGNATURE_METHOD)?)?;

        let c14n_signed_info =
            ulriksdal_c14n::canonicalize_subtree(signed_info, c14n_mode, &inclusive_prefixes)?;
        tracing::trace!(
            signed_info = %String::from_utf8_lossy(&c14n_signed_info),
            "canonical SignedInfo"
        );

        let sig_alg = ulriksdal_crypto::sign::from_uri(sig_method_uri)?;
        let signature = sig_alg.sign(&key.to_crypto_key(), &c14n_signed_info)?;
        tracing::debug!(
            method = sig_method_uri,
            key = key.algorithm_name(),
            signed_info_len = c14n_signed_info.len(),
            "SignedInfo signed"
        );

        let sig_value = required_child(sig_node, ns::node::SIGNATURE_VALUE)?;
        TextEdit::set_text(sig_value, &engine.encode(&signature))?
    };

    Ok(document.apply(vec![signature_edit])?.into_text())
}
