#![forbid(unsafe_code)]

//! Signature algorithm implementations: RSA PKCS#1 v1.5 and ECDSA over
//! P-256 and P-384.

use signature::{SignatureEncoding, Signer, Verifier};
use ulriksdal_core::{algorithm, Error};

/// Key material for signature operations.
#[derive(Debug, Clone)]
pub enum CryptoKey {
    Rsa(rsa::RsaPrivateKey),
    RsaPublic(rsa::RsaPublicKey),
    EcP256(p256::ecdsa::SigningKey),
    EcP256Public(p256::ecdsa::VerifyingKey),
    EcP384(p384::ecdsa::SigningKey),
    EcP384Public(p384::ecdsa::VerifyingKey),
}

impl CryptoKey {
    /// Whether this key can produce signatures.
    pub fn is_private(&self) -> bool {
        matches!(self, Self::Rsa(_) | Self::EcP256(_) | Self::EcP384(_))
    }
}

/// Trait for signature algorithms.
pub trait SignatureAlgorithm: Send + Sync {
    fn uri(&self) -> &'static str;
    fn sign(&self, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>, Error>;
    fn verify(&self, key: &CryptoKey, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// Create a signature algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    let alg: Box<dyn SignatureAlgorithm> = match uri {
        algorithm::RSA_SHA1 => Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA1, hash: HashType::Sha1 }),
        algorithm::RSA_SHA256 => Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA256, hash: HashType::Sha256 }),
        algorithm::RSA_SHA384 => Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA384, hash: HashType::Sha384 }),
        algorithm::RSA_SHA512 => Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA512, hash: HashType::Sha512 }),
        algorithm::ECDSA_SHA256 => Box::new(EcdsaP256),
        algorithm::ECDSA_SHA384 => Box::new(EcdsaP384),
        _ => return Err(Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}"))),
    };
    Ok(alg)
}

#[derive(Debug, Clone, Copy)]
enum HashType {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

// ── RSA PKCS#1 v1.5 ─────────────────────────────────────────────────

struct RsaPkcs1v15 {
    uri: &'static str,
    hash: HashType,
}

impl SignatureAlgorithm for RsaPkcs1v15 {
    fn uri(&self) -> &'static str {
        self.uri
    }

    fn sign(&self, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        let private_key = match key {
            CryptoKey::Rsa(pk) => pk,
            CryptoKey::RsaPublic(_) => {
                return Err(Error::Key("RSA private key required for signing".into()))
            }
            _ => return Err(Error::Key(format!("{} requires an RSA key", self.uri))),
        };
        macro_rules! do_sign {
            ($hasher:ty) => {{
                let sk = rsa::pkcs1v15::SigningKey::<$hasher>::new(private_key.clone());
                sk.try_sign(data)
                    .map(|sig| sig.to_vec())
                    .map_err(|e| Error::Crypto(format!("RSA signing failed: {e}")))
            }};
        }
        match self.hash {
            HashType::Sha1 => do_sign!(sha1::Sha1),
            HashType::Sha256 => do_sign!(sha2::Sha256),
            HashType::Sha384 => do_sign!(sha2::Sha384),
            HashType::Sha512 => do_sign!(sha2::Sha512),
        }
    }

    fn verify(&self, key: &CryptoKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        let public_key = match key {
            CryptoKey::Rsa(pk) => pk.to_public_key(),
            CryptoKey::RsaPublic(pk) => pk.clone(),
            _ => return Err(Error::Key(format!("{} requires an RSA key", self.uri))),
        };
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key);
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_verify!(sha1::Sha1),
            HashType::Sha256 => do_verify!(sha2::Sha256),
            HashType::Sha384 => do_verify!(sha2::Sha384),
            HashType::Sha512 => do_verify!(sha2::Sha512),
        }
    }
}

// ── ECDSA ────────────────────────────────────────────────────────────
//
// XML-DSig carries ECDSA signatures as the fixed-width concatenation r||s,
// not as DER.

struct EcdsaP256;

/// Convert XML-DSig ECDSA r||s to a typed Signature for P-256.
pub fn xmldsig_to_p256(rs: &[u8]) -> Result<p256::ecdsa::Signature, Error> {
    p256::ecdsa::Signature::from_slice(rs)
        .map_err(|e| Error::Crypto(format!("invalid P-256 signature ({} bytes): {e}", rs.len())))
}

impl SignatureAlgorithm for EcdsaP256 {
    fn uri(&self) -> &'static str {
        algorithm::ECDSA_SHA256
    }

    fn sign(&self, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        let CryptoKey::EcP256(sk) = key else {
            return Err(Error::Key("P-256 private key required for signing".into()));
        };
        let sig: p256::ecdsa::Signature = sk
            .try_sign(data)
            .map_err(|e| Error::Crypto(format!("P-256 signing failed: {e}")))?;
        Ok(sig.to_bytes().to_vec())
    }

    fn verify(&self, key: &CryptoKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        let vk = match key {
            CryptoKey::EcP256(sk) => *sk.verifying_key(),
            CryptoKey::EcP256Public(vk) => *vk,
            _ => return Err(Error::Key("P-256 key required".into())),
        };
        let sig = xmldsig_to_p256(sig_bytes)?;
        Ok(vk.verify(data, &sig).is_ok())
    }
}

struct EcdsaP384;

/// Convert XML-DSig ECDSA r||s to a typed Signature for P-384.
pub fn xmldsig_to_p384(rs: &[u8]) -> Result<p384::ecdsa::Signature, Error> {
    p384::ecdsa::Signature::from_slice(rs)
        .map_err(|e| Error::Crypto(format!("invalid P-384 signature ({} bytes): {e}", rs.len())))
}

impl SignatureAlgorithm for EcdsaP384 {
    fn uri(&self) -> &'static str {
        algorithm::ECDSA_SHA384
    }

    fn sign(&self, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        let CryptoKey::EcP384(sk) = key else {
            return Err(Error::Key("P-384 private key required for signing".into()));
        };
        let sig: p384::ecdsa::Signature = sk
            .try_sign(data)
            .map_err(|e| Error::Crypto(format!("P-384 signing failed: {e}")))?;
        Ok(sig.to_bytes().to_vec())
    }

    fn verify(&self, key: &CryptoKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        let vk = match key {
            CryptoKey::EcP384(sk) => *sk.verifying_key(),
            CryptoKey::EcP384Public(vk) => *vk,
            _ => return Err(Error::Key("P-384 key required".into())),
        };
        let sig = xmldsig_to_p384(sig_bytes)?;
        Ok(vk.verify(data, &sig).is_ok())
    }
}
