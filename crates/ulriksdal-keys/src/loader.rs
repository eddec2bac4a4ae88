#![forbid(unsafe_code)]

//! Key loading from PEM and DER: PKCS#8, PKCS#1 and SEC1 private keys,
//! SubjectPublicKeyInfo public keys and X.509 certificates.

use crate::key::{Key, KeyData};
use std::path::Path;
use ulriksdal_core::Error;

const PEM_BEGIN: &str = "-----BEGIN ";

/// Split PEM text into its individual `-----BEGIN ...-----` blocks.
fn pem_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(PEM_BEGIN) {
        let block = &rest[start..];
        let end = block[PEM_BEGIN.len()..]
            .find(PEM_BEGIN)
            .map(|i| i + PEM_BEGIN.len())
            .unwrap_or(block.len());
        blocks.push(block[..end].trim());
        rest = &block[end..];
    }
    blocks
}

fn decode_pem(block: &str) -> Result<(&str, Vec<u8>), Error> {
    pem_rfc7468::decode_vec(block.as_bytes())
        .map_err(|e| Error::Key(format!("failed to decode PEM: {e}")))
}

fn first_pem_block(pem_data: &[u8]) -> Result<(&str, Vec<u8>), Error> {
    let text = std::str::from_utf8(pem_data)
        .map_err(|e| Error::Key(format!("invalid PEM encoding: {e}")))?;
    let block = pem_blocks(text)
        .into_iter()
        .next()
        .ok_or_else(|| Error::Key("no PEM block found".into()))?;
    decode_pem(block)
}

/// Load a private key from PEM data (`PRIVATE KEY`, `RSA PRIVATE KEY` or
/// `EC PRIVATE KEY`).
pub fn load_private_key_pem(pem_data: &[u8]) -> Result<Key, Error> {
    let (label, der) = first_pem_block(pem_data)?;
    match label {
        "PRIVATE KEY" => load_pkcs8_der(&der),
        "RSA PRIVATE KEY" => load_rsa_pkcs1_der(&der),
        "EC PRIVATE KEY" => load_sec1_der(&der),
        "ENCRYPTED PRIVATE KEY" => Err(Error::Key(
            "encrypted private keys are not supported; decrypt the key first".into(),
        )),
        other => Err(Error::Key(format!("expected a private key PEM, got: {other}"))),
    }
}

/// Load a private key from PKCS#8 DER bytes.
///
/// Tries RSA, then EC P-256 and P-384.
pub fn load_pkcs8_der(der: &[u8]) -> Result<Key, Error> {
    use pkcs8::DecodePrivateKey;

    if let Ok(pk) = rsa::RsaPrivateKey::from_pkcs8_der(der) {
        let public = pk.to_public_key();
        return Ok(Key::new(KeyData::Rsa {
            private: Some(pk),
            public,
        }));
    }

    if let Ok(sk) = p256::ecdsa::SigningKey::from_pkcs8_der(der) {
        let public = *sk.verifying_key();
        return Ok(Key::new(KeyData::EcP256 {
            private: Some(sk),
            public,
        }));
    }

    if let Ok(sk) = p384::ecdsa::SigningKey::from_pkcs8_der(der) {
        let public = *sk.verifying_key();
        return Ok(Key::new(KeyData::EcP384 {
            private: Some(sk),
            public,
        }));
    }

    Err(Error::Key(
        "unable to parse PKCS#8 private key (tried RSA, P-256, P-384)".into(),
    ))
}

/// Load an RSA private key from PKCS#1 DER bytes.
pub fn load_rsa_pkcs1_der(der: &[u8]) -> Result<Key, Error> {
    use pkcs1::DecodeRsaPrivateKey;
    let pk = rsa::RsaPrivateKey::from_pkcs1_der(der)
        .map_err(|e| Error::Key(format!("failed to parse PKCS#1 RSA private key: {e}")))?;
    let public = pk.to_public_key();
    Ok(Key::new(KeyData::Rsa {
        private: Some(pk),
        public,
    }))
}

/// Load an EC private key from SEC1 (`EC PRIVATE KEY`) DER bytes.
pub fn load_sec1_der(der: &[u8]) -> Result<Key, Error> {
    if let Ok(secret) = p256::SecretKey::from_sec1_der(der) {
        let sk = p256::ecdsa::SigningKey::from(secret);
        let public = *sk.verifying_key();
        return Ok(Key::new(KeyData::EcP256 {
            private: Some(sk),
            public,
        }));
    }
    if let Ok(secret) = p384::SecretKey::from_sec1_der(der) {
        let sk = p384::ecdsa::SigningKey::from(secret);
        let public = *sk.verifying_key();
        return Ok(Key::new(KeyData::EcP384 {
            private: Some(sk),
            public,
        }));
    }
    Err(Error::Key("unable to parse SEC1 EC private key (tried P-256, P-384)".into()))
}

/// Load a public key from SubjectPublicKeyInfo DER bytes.
pub fn load_spki_der(spki_der: &[u8]) -> Result<Key, Error> {
    use spki::DecodePublicKey;

    if let Ok(public) = rsa::RsaPublicKey::from_public_key_der(spki_der) {
        return Ok(Key::new(KeyData::Rsa {
            private: None,
            public,
        }));
    }
    if let Ok(public) = p256::ecdsa::VerifyingKey::from_public_key_der(spki_der) {
        return Ok(Key::new(KeyData::EcP256 {
            private: None,
            public,
        }));
    }
    if let Ok(public) = p384::ecdsa::VerifyingKey::from_public_key_der(spki_der) {
        return Ok(Key::new(KeyData::EcP384 {
            private: None,
            public,
        }));
    }
    Err(Error::Key("unsupported public key algorithm in SPKI".into()))
}

/// Load the public key of a DER-encoded X.509 certificate.  The
/// certificate itself becomes the key's `x509_chain`.
pub fn load_x509_cert_der(data: &[u8]) -> Result<Key, Error> {
    use der::{Decode, Encode};

    let cert = x509_cert::Certificate::from_der(data)
        .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))?;
    let spki_der = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| Error::Certificate(format!("failed to encode SPKI: {e}")))?;

    let mut key = load_spki_der(&spki_der)
        .map_err(|e| Error::Certificate(format!("certificate public key: {e}")))?;
    key.x509_chain = vec![data.to_vec()];
    Ok(key)
}

/// Load certificates from PEM data.  Every `CERTIFICATE` block is kept in
/// the chain in file order; the first one provides the public key.
pub fn load_x509_cert_pem(pem_data: &[u8]) -> Result<Key, Error> {
    let text = std::str::from_utf8(pem_data)
        .map_err(|e| Error::Certificate(format!("invalid PEM encoding: {e}")))?;

    let mut chain = Vec::new();
    for block in pem_blocks(text) {
        let (label, der) = decode_pem(block)?;
        if label != "CERTIFICATE" {
            return Err(Error::Certificate(format!(
                "expected CERTIFICATE PEM label, got: {label}"
            )));
        }
        chain.push(der);
    }

    let leaf = chain
        .first()
        .ok_or_else(|| Error::Certificate("no certificate found in PEM data".into()))?;
    let mut key = load_x509_cert_der(leaf)?;
    key.x509_chain = chain;
    Ok(key)
}

/// Auto-detect the PEM label and load accordingly.
pub fn load_pem_auto(pem_data: &[u8]) -> Result<Key, Error> {
    let (label, der) = first_pem_block(pem_data)?;
    match label {
        "CERTIFICATE" => load_x509_cert_pem(pem_data),
        "PUBLIC KEY" => load_spki_der(&der),
        _ => load_private_key_pem(pem_data),
    }
}

/// Combine a certificate and its private key into a signing credential.
///
/// The private key must belong to the certificate's public key.
pub fn load_credential(certificate: Key, private_key: Key) -> Result<Key, Error> {
    if !private_key.has_private_key() {
        return Err(Error::Key("credential key has no private part".into()));
    }
    if certificate.x509_chain.is_empty() {
        return Err(Error::Certificate("credential certificate is missing".into()));
    }
    if !certificate.data.same_public_key(&private_key.data) {
        return Err(Error::Key(
            "private key does not match the certificate's public key".into(),
        ));
    }
    Ok(Key {
        name: private_key.name.or(certificate.name),
        data: private_key.data,
        x509_chain: certificate.x509_chain,
    })
}

/// Load a signing credential from a certificate PEM and a private key PEM.
pub fn load_credential_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Key, Error> {
    load_credential(load_x509_cert_pem(cert_pem)?, load_private_key_pem(key_pem)?)
}

/// Load a key from a file, auto-detecting PEM or DER.
pub fn load_key_file(path: &Path) -> Result<Key, Error> {
    let data = std::fs::read(path)?;

    let leading = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    if data[leading..].starts_with(PEM_BEGIN.as_bytes()) {
        return load_pem_auto(&data);
    }

    load_pkcs8_der(&data)
        .or_else(|_| load_rsa_pkcs1_der(&data))
        .or_else(|_| load_x509_cert_der(&data))
        .or_else(|_| load_spki_der(&data))
        .map_err(|_| {
            Error::Key(format!(
                "unable to auto-detect key format from file: {}",
                path.display()
            ))
        })
}

/// Load a signing credential from a certificate file and a private key file.
pub fn load_credential_files(cert_path: &Path, key_path: &Path) -> Result<Key, Error> {
    let certificate = load_key_file(cert_path)?;
    let private_key = load_key_file(key_path)?;
    load_credential(certificate, private_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! testdata {
        ($name:literal) => {
            include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata/", $name))
        };
    }

    #[test]
    fn loads_pkcs8_rsa_key() {
        let key = load_private_key_pem(testdata!("idp-key.pem")).unwrap();
        assert_eq!(key.algorithm_name(), "RSA");
        assert!(key.has_private_key());
    }

    #[test]
    fn loads_pkcs1_rsa_key() {
        let key = load_private_key_pem(testdata!("other-rsa-key.pem")).unwrap();
        assert_eq!(key.algorithm_name(), "RSA");
        assert!(key.has_private_key());
    }

    #[test]
    fn loads_ec_key_and_certificate() {
        let key = load_credential_pem(testdata!("idp-ec-cert.pem"), testdata!("idp-ec-key.pem"))
            .unwrap();
        assert_eq!(key.algorithm_name(), "EC P-256");
        assert_eq!(key.x509_chain.len(), 1);
    }

    #[test]
    fn certificate_has_only_public_key() {
        let cert = load_x509_cert_pem(testdata!("idp-cert.pem")).unwrap();
        assert!(!cert.has_private_key());
        assert_eq!(cert.x509_chain.len(), 1);
        assert!(matches!(cert.data, KeyData::Rsa { .. }));
    }

    #[test]
    fn credential_combines_matching_pair() {
        let key = load_credential_pem(testdata!("idp-cert.pem"), testdata!("idp-key.pem")).unwrap();
        assert!(key.has_private_key());
        assert!(key.certificate().is_some());
    }

    #[test]
    fn credential_rejects_mismatched_key() {
        let err = load_credential_pem(testdata!("idp-cert.pem"), testdata!("other-rsa-key.pem"))
            .unwrap_err();
        assert!(matches!(err, Error::Key(_)));

        let err = load_credential_pem(testdata!("idp-cert.pem"), testdata!("idp-ec-key.pem"))
            .unwrap_err();
        assert!(matches!(err, Error::Key(_)));
    }

    #[test]
    fn auto_detection_by_label() {
        assert!(load_pem_auto(testdata!("idp-cert.pem")).unwrap().certificate().is_some());
        assert!(load_pem_auto(testdata!("idp-key.pem")).unwrap().has_private_key());
        assert!(load_private_key_pem(testdata!("idp-cert.pem")).is_err());
    }

    #[test]
    fn chain_keeps_every_certificate() {
        let mut pem = testdata!("idp-cert.pem").to_vec();
        pem.extend_from_slice(testdata!("idp-ec-cert.pem"));
        let key = load_x509_cert_pem(&pem).unwrap();
        assert_eq!(key.algorithm_name(), "RSA");
        assert_eq!(key.x509_chain.len(), 2);
    }

    #[test]
    fn loads_files_from_disk() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata");
        let key = load_credential_files(
            &Path::new(dir).join("idp-cert.pem"),
            &Path::new(dir).join("idp-key.pem"),
        )
        .unwrap();
        assert!(key.has_private_key());
        assert!(matches!(
            load_key_file(&Path::new(dir).join("missing.pem")),
            Err(Error::Io(_))
        ));
    }
}
