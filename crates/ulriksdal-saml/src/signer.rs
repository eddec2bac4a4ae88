#![forbid(unsafe_code)]

//! Enveloped signing of the assertion inside a serialized Response.

use ulriksdal_dsig::{DsigContext, SignatureTemplate};
use ulriksdal_keys::Key;
use ulriksdal_xml::{xpath, NsContext, TextEdit, XmlDocument};

use crate::error::{SamlError, SamlResult};
use crate::urn;

/// Sign the `saml2:Assertion` child of the document element of `xml`.
///
/// The `<ds:Signature>` is spliced in as the immediate next sibling of the
/// assertion's `saml2:Issuer` and then filled in, so the digest covers the
/// exact text that is returned.
pub fn sign_assertion(ctx: &DsigContext, credential: &Key, xml: &str) -> SamlResult<String> {
    if !credential.has_private_key() {
        return Err(SamlError::Signing(
            "credential has no private key".into(),
        ));
    }

    let document = XmlDocument::parse(xml.to_owned())?;
    let splice = {
        let doc = document.parse_doc()?;
        let ns = NsContext::new()
            .bind(urn::PROTOCOL_PREFIX, urn::PROTOCOL)
            .bind(urn::ASSERTION_PREFIX, urn::ASSERTION);

        let mut assertions = xpath::select(doc.root(), "/*/saml2:Assertion", &ns)?.into_iter();
        let assertion = assertions
            .next()
            .ok_or_else(|| SamlError::Structural("document has no saml2:Assertion".into()))?;
        if assertions.next().is_some() {
            return Err(SamlError::Structural(
                "document has more than one saml2:Assertion".into(),
            ));
        }
        let assertion_id = assertion
            .attribute(urn::attr::ID)
            .ok_or_else(|| SamlError::Structural("saml2:Assertion has no ID".into()))?;
        let issuer = xpath::select_single(assertion, "saml2:Issuer", &ns)?
            .ok_or_else(|| SamlError::Structural("saml2:Assertion has no saml2:Issuer".into()))?;

        let template = SignatureTemplate::enveloped(ctx, credential, assertion_id)?;
        tracing::debug!(
            assertion_id,
            offset = issuer.range().end,
            digest = %template.digest_method,
            signature = %template.signature_method,
            "splicing signature template after assertion issuer"
        );
        TextEdit::insert_after(issuer, template.to_xml())
    };

    let spliced = document.apply(vec![splice])?;
    Ok(ulriksdal_dsig::sign::sign(ctx, credential, spliced.text())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulriksdal_core::ns;

    fn credential() -> Key {
        let cert = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata/idp-cert.pem"));
        let key = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata/idp-key.pem"));
        ulriksdal_keys::loader::load_credential_pem(cert, key).unwrap()
    }

    const RESPONSE: &str = r#"<saml2p:Response xmlns:saml2p="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml2="urn:oasis:names:tc:SAML:2.0:assertion" ID="_r">
  <saml2:Issuer>idp</saml2:Issuer>
  <saml2:Assertion ID="_a" Version="2.0">
    <saml2:Issuer>idp</saml2:Issuer>
    <saml2:Subject>s</saml2:Subject>
  </saml2:Assertion>
</saml2p:Response>"#;

    #[test]
    fn signature_follows_the_assertion_issuer() {
        let signed = sign_assertion(&DsigContext::default(), &credential(), RESPONSE).unwrap();
        assert!(signed.contains("<saml2:Issuer>idp</saml2:Issuer><ds:Signature "));

        let doc = roxmltree::Document::parse(&signed).unwrap();
        let sig = doc
            .descendants()
            .find(|n| n.has_tag_name((ns::DSIG, "Signature")))
            .unwrap();
        assert_eq!(sig.parent_element().and_then(|p| p.attribute("ID")), Some("_a"));
        let reference = sig
            .descendants()
            .find(|n| n.has_tag_name((ns::DSIG, "Reference")))
            .unwrap();
        assert_eq!(reference.attribute("URI"), Some("#_a"));
    }

    #[test]
    fn missing_assertion_is_structural() {
        let xml = r#"<saml2p:Response xmlns:saml2p="urn:oasis:names:tc:SAML:2.0:protocol"/>"#;
        assert!(matches!(
            sign_assertion(&DsigContext::default(), &credential(), xml),
            Err(SamlError::Structural(_))
        ));
    }

    #[test]
    fn missing_issuer_is_structural() {
        let xml = RESPONSE.replace("    <saml2:Issuer>idp</saml2:Issuer>\n", "");
        assert!(matches!(
            sign_assertion(&DsigContext::default(), &credential(), &xml),
            Err(SamlError::Structural(_))
        ));
    }

    #[test]
    fn assertion_without_id_is_structural() {
        let xml = RESPONSE.replace(r#"ID="_a" "#, "");
        assert!(matches!(
            sign_assertion(&DsigContext::default(), &credential(), &xml),
            Err(SamlError::Structural(_))
        ));
    }

    #[test]
    fn duplicate_ids_are_structural() {
        let xml = RESPONSE.replace(r#"ID="_r""#, r#"ID="_a""#);
        assert!(matches!(
            sign_assertion(&DsigContext::default(), &credential(), &xml),
            Err(SamlError::Structural(_))
        ));
    }

    #[test]
    fn certificate_only_credential_cannot_sign() {
        let cert = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata/idp-cert.pem"));
        let public = ulriksdal_keys::loader::load_x509_cert_pem(cert).unwrap();
        assert!(matches!(
            sign_assertion(&DsigContext::default(), &public, RESPONSE),
            Err(SamlError::Signing(_))
        ));
    }
}
