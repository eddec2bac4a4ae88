#![forbid(unsafe_code)]

//! Construction of enveloped `<ds:Signature>` templates.
//!
//! A template carries every element of the final signature with empty
//! `DigestValue` and `SignatureValue`; [`crate::sign::sign`] fills them in
//! once the template is in place inside the document.

use base64::Engine;
use ulriksdal_core::{algorithm, ns, Error};
use ulriksdal_keys::Key;
use ulriksdal_xml::Element;

use crate::context::DsigContext;

/// An unsigned `<ds:Signature>` with a single reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTemplate {
    pub c14n_method: String,
    pub signature_method: String,
    pub reference_uri: String,
    /// Transform algorithm URIs, in application order.
    pub transforms: Vec<String>,
    pub digest_method: String,
    pub key_name: Option<String>,
    /// DER certificates published in `<ds:X509Data>`, leaf first.
    pub certificates: Vec<Vec<u8>>,
}

impl SignatureTemplate {
    /// Template for an enveloped signature over the element with the given
    /// ID, signed by `key`.
    ///
    /// The transforms are enveloped-signature followed by the context's
    /// canonicalization.  The algorithms are checked here so that an
    /// unsupported URI fails before the document is touched.
    pub fn enveloped(ctx: &DsigContext, key: &Key, id: &str) -> Result<Self, Error> {
        let signature_method = ctx
            .signature_method
            .clone()
            .unwrap_or_else(|| key.default_signature_method().to_owned());
        ulriksdal_crypto::sign::from_uri(&signature_method)?;
        ulriksdal_crypto::digest::from_uri(&ctx.digest_method)?;

        let (key_name, certificates) = if ctx.embed_certificate {
            let certs = key.certificate().map(|c| vec![c.to_vec()]).unwrap_or_default();
            (key.name.clone(), certs)
        } else {
            (None, Vec::new())
        };

        Ok(Self {
            c14n_method: ctx.c14n_mode.uri().to_owned(),
            signature_method,
            reference_uri: format!("#{id}"),
            transforms: vec![
                algorithm::ENVELOPED_SIGNATURE.to_owned(),
                ctx.c14n_mode.uri().to_owned(),
            ],
            digest_method: ctx.digest_method.clone(),
            key_name,
            certificates,
        })
    }

    pub fn to_element(&self) -> Element {
        let transforms = self
            .transforms
            .iter()
            .map(|uri| ds(ns::node::TRANSFORM).attr(ns::attr::ALGORITHM, uri.as_str()));

        let signed_info = ds(ns::node::SIGNED_INFO)
            .child(ds(ns::node::CANONICALIZATION_METHOD).attr(ns::attr::ALGORITHM, self.c14n_method.as_str()))
            .child(ds(ns::node::SIGNATURE_METHOD).attr(ns::attr::ALGORITHM, self.signature_method.as_str()))
            .child(
                ds(ns::node::REFERENCE)
                    .attr(ns::attr::URI, self.reference_uri.as_str())
                    .child(ds(ns::node::TRANSFORMS).children(transforms))
                    .child(ds(ns::node::DIGEST_METHOD).attr(ns::attr::ALGORITHM, self.digest_method.as_str()))
                    .child(ds(ns::node::DIGEST_VALUE)),
            );

        ds(ns::node::SIGNATURE)
            .ns(Some(ns::DSIG_PREFIX), ns::DSIG)
            .child(signed_info)
            .child(ds(ns::node::SIGNATURE_VALUE))
            .child_opt(self.key_info())
    }

    /// Compact markup, ready to splice into a document.
    pub fn to_xml(&self) -> String {
        self.to_element().to_string()
    }

    fn key_info(&self) -> Option<Element> {
        if self.key_name.is_none() && self.certificates.is_empty() {
            return None;
        }
        let engine = base64::engine::general_purpose::STANDARD;
        let x509_data = (!self.certificates.is_empty()).then(|| {
            ds(ns::node::X509_DATA).children(
                self.certificates
                    .iter()
                    .map(|der| ds(ns::node::X509_CERTIFICATE).text(engine.encode(der))),
            )
        });
        Some(
            ds(ns::node::KEY_INFO)
                .child_opt(self.key_name.as_ref().map(|n| ds(ns::node::KEY_NAME).text(n.as_str())))
                .child_opt(x509_data),
        )
    }
}

fn ds(local_name: &str) -> Element {
    Element::new(format!("{}:{local_name}", ns::DSIG_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Key {
        let cert = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata/idp-cert.pem"));
        let key = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata/idp-key.pem"));
        ulriksdal_keys::loader::load_credential_pem(cert, key).unwrap()
    }

    #[test]
    fn enveloped_template_layout() {
        let tmpl = SignatureTemplate::enveloped(&DsigContext::default(), &credential(), "_abc").unwrap();
        assert_eq!(tmpl.reference_uri, "#_abc");
        assert_eq!(tmpl.signature_method, algorithm::RSA_SHA256);

        let xml = tmpl.to_xml();
        assert!(xml.starts_with(r#"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:SignedInfo>"#));
        assert!(xml.contains(concat!(
            r#"<ds:Transforms><ds:Transform Algorithm="http://www.w3.org/2000/09/xmldsig#enveloped-signature"/>"#,
            r#"<ds:Transform Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"/></ds:Transforms>"#
        )));
        assert!(xml.contains("<ds:DigestValue/></ds:Reference></ds:SignedInfo><ds:SignatureValue/>"));
        assert!(xml.contains("<ds:KeyInfo><ds:X509Data><ds:X509Certificate>MII"));

        let doc = ulriksdal_xml::parse(&xml).unwrap();
        let root = doc.root_element();
        assert_eq!(root.tag_name().namespace(), Some(ns::DSIG));
        assert_eq!(root.children().filter(|n| n.is_element()).count(), 3);
    }

    #[test]
    fn key_info_can_be_left_out() {
        let ctx = DsigContext::default().with_key_info(false);
        let xml = SignatureTemplate::enveloped(&ctx, &credential(), "x").unwrap().to_xml();
        assert!(!xml.contains("KeyInfo"));
    }

    #[test]
    fn key_name_is_published() {
        let key = credential().with_name("idp-2026");
        let xml = SignatureTemplate::enveloped(&DsigContext::default(), &key, "x").unwrap().to_xml();
        assert!(xml.contains("<ds:KeyInfo><ds:KeyName>idp-2026</ds:KeyName><ds:X509Data>"));
    }

    #[test]
    fn unsupported_algorithms_are_rejected() {
        let ctx = DsigContext::default().with_digest_method("http://example.com/md4");
        assert!(matches!(
            SignatureTemplate::enveloped(&ctx, &credential(), "x"),
            Err(Error::UnsupportedAlgorithm(_))
        ));
        let ctx = DsigContext::default().with_signature_method("http://example.com/rot13");
        assert!(matches!(
            SignatureTemplate::enveloped(&ctx, &credential(), "x"),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }
}
