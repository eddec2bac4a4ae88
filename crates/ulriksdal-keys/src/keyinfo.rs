#![forbid(unsafe_code)]

//! KeyInfo XML processing: reads `<ds:KeyInfo>` to recover the signer's
//! public key.

use crate::key::Key;
use base64::Engine;
use ulriksdal_core::{ns, Error};

/// Decode the base64 text of an element, ignoring embedded whitespace.
fn decode_base64_text(node: roxmltree::Node<'_, '_>) -> Result<Vec<u8>, Error> {
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

fn dsig_children<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    local_name: &'static str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
    node.children().filter(move |c| {
        c.is_element()
            && c.tag_name().name() == local_name
            && c.tag_name().namespace() == Some(ns::DSIG)
    })
}

/// Extract a verification key from a `<ds:KeyInfo>` element.
///
/// Every `X509Data/X509Certificate` is collected into the key's chain; the
/// first certificate provides the public key.  `KeyName` becomes the key
/// name.  Returns `Ok(None)` when the KeyInfo carries no certificate.
pub fn extract_key(key_info: roxmltree::Node<'_, '_>) -> Result<Option<Key>, Error> {
    let mut chain = Vec::new();
    for data in dsig_children(key_info, ns::node::X509_DATA) {
        for cert in dsig_children(data, ns::node::X509_CERTIFICATE) {
            chain.push(decode_base64_text(cert)?);
        }
    }

    let Some(leaf) = chain.first() else {
        return Ok(None);
    };
    let mut key = crate::loader::load_x509_cert_der(leaf)?;
    key.x509_chain = chain;
    key.name = dsig_children(key_info, ns::node::KEY_NAME)
        .next()
        .and_then(|n| n.text())
        .map(|t| t.trim().to_owned());
    Ok(Some(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert_b64() -> String {
        let pem = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata/idp-cert.pem"));
        let key = crate::loader::load_x509_cert_pem(pem).unwrap();
        base64::engine::general_purpose::STANDARD.encode(&key.x509_chain[0])
    }

    #[test]
    fn extracts_certificate_key() {
        let b64 = cert_b64();
        // Wrapped the way many signers emit it.
        let wrapped: Vec<&str> = b64
            .as_bytes()
            .chunks(64)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect();
        let xml = format!(
            r#"<ds:KeyInfo xmlns:ds="{}"><ds:KeyName>idp</ds:KeyName><ds:X509Data><ds:X509Certificate>
{}
</ds:X509Certificate></ds:X509Data></ds:KeyInfo>"#,
            ns::DSIG,
            wrapped.join("\n")
        );
        let doc = ulriksdal_xml::parse(&xml).unwrap();
        let key = extract_key(doc.root_element()).unwrap().unwrap();
        assert_eq!(key.name.as_deref(), Some("idp"));
        assert!(!key.has_private_key());
        assert_eq!(key.x509_chain.len(), 1);
    }

    #[test]
    fn no_certificate_means_no_key() {
        let xml = format!(r#"<ds:KeyInfo xmlns:ds="{}"><ds:KeyName>k</ds:KeyName></ds:KeyInfo>"#, ns::DSIG);
        let doc = ulriksdal_xml::parse(&xml).unwrap();
        assert!(extract_key(doc.root_element()).unwrap().is_none());
    }

    #[test]
    fn bad_base64_is_reported() {
        let xml = format!(
            r#"<ds:KeyInfo xmlns:ds="{}"><ds:X509Data><ds:X509Certificate>!!!</ds:X509Certificate></ds:X509Data></ds:KeyInfo>"#,
            ns::DSIG
        );
        let doc = ulriksdal_xml::parse(&xml).unwrap();
        assert!(matches!(extract_key(doc.root_element()), Err(Error::Base64(_))));
    }
}
