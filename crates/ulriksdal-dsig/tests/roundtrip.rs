//! Sign-then-verify scenarios over enveloped signatures.

use ulriksdal_core::algorithm;
use ulriksdal_dsig::{sign::sign, verify::verify, DsigContext, SignatureTemplate, VerifyResult};
use ulriksdal_keys::{loader, Key};

macro_rules! testdata {
    ($name:literal) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata/", $name))
    };
}

fn rsa_credential() -> Key {
    loader::load_credential_pem(testdata!("idp-cert.pem"), testdata!("idp-key.pem")).unwrap()
}

fn ec_credential() -> Key {
    loader::load_credential_pem(testdata!("idp-ec-cert.pem"), testdata!("idp-ec-key.pem")).unwrap()
}

/// A small document with a prefixed, signable element nested below the root
/// and the template placed right after its first child.
fn signed_document(ctx: &DsigContext, key: &Key) -> String {
    let template = SignatureTemplate::enveloped(ctx, key, "_a1").unwrap().to_xml();
    let xml = format!(
        r#"<p:Envelope xmlns:p="urn:example:p" ID="_e1">
  <p:Header>h</p:Header>
  <a:Item xmlns:a="urn:example:a" ID="_a1" Version="2.0"><a:Owner>idp</a:Owner>{template}
    <a:Payload kind="x">payload &amp; more</a:Payload>
  </a:Item>
</p:Envelope>"#
    );
    sign(ctx, key, &xml).unwrap()
}

#[test]
fn rsa_round_trip_with_embedded_certificate() {
    let ctx = DsigContext::default();
    let signed = signed_document(&ctx, &rsa_credential());
    assert_eq!(verify(&ctx, &signed, None).unwrap(), VerifyResult::Valid);
}

#[test]
fn ecdsa_round_trip() {
    let ctx = DsigContext::default();
    let key = ec_credential();
    let signed = signed_document(&ctx, &key);
    assert!(signed.contains(algorithm::ECDSA_SHA256));
    assert!(verify(&ctx, &signed, Some(&key)).unwrap().is_valid());
}

#[test]
fn alternative_digest_and_signature_methods() {
    let ctx = DsigContext::default()
        .with_digest_method(algorithm::SHA512)
        .with_signature_method(algorithm::RSA_SHA1);
    let signed = signed_document(&ctx, &rsa_credential());
    assert!(signed.contains(algorithm::SHA512));
    assert!(signed.contains(algorithm::RSA_SHA1));
    assert!(verify(&DsigContext::default(), &signed, None).unwrap().is_valid());
}

#[test]
fn tampered_content_fails_the_digest() {
    let ctx = DsigContext::default();
    let signed = signed_document(&ctx, &rsa_credential());
    let tampered = signed.replace("payload &amp; more", "payload &amp; less");
    match verify(&ctx, &tampered, None).unwrap() {
        VerifyResult::Invalid { reason } => assert!(reason.contains("digest"), "{reason}"),
        VerifyResult::Valid => panic!("tampered document verified"),
    }
}

#[test]
fn content_outside_the_reference_is_not_covered() {
    let ctx = DsigContext::default();
    let signed = signed_document(&ctx, &rsa_credential());
    let edited = signed.replace("<p:Header>h</p:Header>", "<p:Header>changed</p:Header>");
    assert!(verify(&ctx, &edited, None).unwrap().is_valid());
}

#[test]
fn whitespace_inside_the_reference_is_significant() {
    let ctx = DsigContext::default();
    let signed = signed_document(&ctx, &rsa_credential());
    let edited = signed.replacen("\n    <a:Payload", "\n      <a:Payload", 1);
    assert!(!verify(&ctx, &edited, None).unwrap().is_valid());
}

#[test]
fn tampered_signed_info_fails_the_signature() {
    let ctx = DsigContext::default();
    let signed = signed_document(&ctx, &rsa_credential());
    let tampered = signed.replace(
        r##"<ds:Reference URI="#_a1">"##,
        r##"<ds:Reference URI="#_a1" Type="urn:x">"##,
    );
    match verify(&ctx, &tampered, None).unwrap() {
        VerifyResult::Invalid { reason } => assert!(reason.contains("signature"), "{reason}"),
        VerifyResult::Valid => panic!("tampered SignedInfo verified"),
    }
}

#[test]
fn wrong_key_is_invalid() {
    let ctx = DsigContext::default();
    let signed = signed_document(&ctx, &rsa_credential());
    let other = loader::load_private_key_pem(testdata!("other-rsa-key.pem")).unwrap();
    assert!(!verify(&ctx, &signed, Some(&other)).unwrap().is_valid());
}

#[test]
fn without_key_info_a_key_must_be_supplied() {
    let ctx = DsigContext::default().with_key_info(false);
    let key = rsa_credential();
    let signed = signed_document(&ctx, &key);
    assert!(!signed.contains("KeyInfo"));
    assert!(verify(&ctx, &signed, None).is_err());
    assert!(verify(&ctx, &signed, Some(&key)).unwrap().is_valid());
}

#[test]
fn signature_is_placed_where_the_template_was() {
    let ctx = DsigContext::default();
    let signed = signed_document(&ctx, &rsa_credential());
    assert!(signed.contains("<a:Owner>idp</a:Owner><ds:Signature xmlns:ds="));
}
