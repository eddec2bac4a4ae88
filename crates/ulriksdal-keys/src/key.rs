#![forbid(unsafe_code)]

//! Key types and data structures.

use ulriksdal_core::algorithm;
use ulriksdal_crypto::CryptoKey;

/// The underlying asymmetric key data. The public half is always present.
#[derive(Clone)]
pub enum KeyData {
    Rsa {
        private: Option<rsa::RsaPrivateKey>,
        public: rsa::RsaPublicKey,
    },
    EcP256 {
        private: Option<p256::ecdsa::SigningKey>,
        public: p256::ecdsa::VerifyingKey,
    },
    EcP384 {
        private: Option<p384::ecdsa::SigningKey>,
        public: p384::ecdsa::VerifyingKey,
    },
}

impl std::fmt::Debug for KeyData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.has_private() {
            "private+public"
        } else {
            "public"
        };
        write!(f, "{} {kind} key", self.algorithm_name())
    }
}

impl KeyData {
    /// Human-readable algorithm name.
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            Self::Rsa { .. } => "RSA",
            Self::EcP256 { .. } => "EC P-256",
            Self::EcP384 { .. } => "EC P-384",
        }
    }

    pub fn has_private(&self) -> bool {
        match self {
            Self::Rsa { private, .. } => private.is_some(),
            Self::EcP256 { private, .. } => private.is_some(),
            Self::EcP384 { private, .. } => private.is_some(),
        }
    }

    /// Whether both values carry the same public key.
    pub fn same_public_key(&self, other: &KeyData) -> bool {
        match (self, other) {
            (Self::Rsa { public: a, .. }, Self::Rsa { public: b, .. }) => a == b,
            (Self::EcP256 { public: a, .. }, Self::EcP256 { public: b, .. }) => a == b,
            (Self::EcP384 { public: a, .. }, Self::EcP384 { public: b, .. }) => a == b,
            _ => false,
        }
    }

    /// The signature method used when none is configured.
    pub fn default_signature_method(&self) -> &'static str {
        match self {
            Self::Rsa { .. } => algorithm::RSA_SHA256,
            Self::EcP256 { .. } => algorithm::ECDSA_SHA256,
            Self::EcP384 { .. } => algorithm::ECDSA_SHA384,
        }
    }
}

/// A key with optional name and X.509 certificate chain.
///
/// A key with both a private part and a certificate is a signing
/// credential: the certificate is published in `<ds:KeyInfo>`.
#[derive(Debug, Clone)]
pub struct Key {
    /// Optional name, published as `<ds:KeyName>` when set.
    pub name: Option<String>,
    /// The key data.
    pub data: KeyData,
    /// X.509 certificate chain (DER-encoded), leaf first.
    pub x509_chain: Vec<Vec<u8>>,
}

impl Key {
    /// Create a new key.
    pub fn new(data: KeyData) -> Self {
        Self {
            name: None,
            data,
            x509_chain: Vec::new(),
        }
    }

    /// Set the key name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn has_private_key(&self) -> bool {
        self.data.has_private()
    }

    /// The leaf certificate, if any.
    pub fn certificate(&self) -> Option<&[u8]> {
        self.x509_chain.first().map(Vec::as_slice)
    }

    pub fn algorithm_name(&self) -> &'static str {
        self.data.algorithm_name()
    }

    pub fn default_signature_method(&self) -> &'static str {
        self.data.default_signature_method()
    }

    /// Convert to a `CryptoKey` for use with crypto algorithms.  The private
    /// half is used when present.
    pub fn to_crypto_key(&self) -> CryptoKey {
        match &self.data {
            KeyData::Rsa { private: Some(pk), .. } => CryptoKey::Rsa(pk.clone()),
            KeyData::Rsa { public, .. } => CryptoKey::RsaPublic(public.clone()),
            KeyData::EcP256 { private: Some(sk), .. } => CryptoKey::EcP256(sk.clone()),
            KeyData::EcP256 { public, .. } => CryptoKey::EcP256Public(*public),
            KeyData::EcP384 { private: Some(sk), .. } => CryptoKey::EcP384(sk.clone()),
            KeyData::EcP384 { public, .. } => CryptoKey::EcP384Public(*public),
        }
    }

    /// Convert to a public-only `CryptoKey`.
    pub fn to_verification_key(&self) -> CryptoKey {
        match &self.data {
            KeyData::Rsa { public, .. } => CryptoKey::RsaPublic(public.clone()),
            KeyData::EcP256 { public, .. } => CryptoKey::EcP256Public(*public),
            KeyData::EcP384 { public, .. } => CryptoKey::EcP384Public(*public),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p256(seed: u8) -> KeyData {
        let sk = p256::ecdsa::SigningKey::from_slice(&[seed; 32]).unwrap();
        KeyData::EcP256 {
            public: *sk.verifying_key(),
            private: Some(sk),
        }
    }

    #[test]
    fn public_projection_keeps_identity() {
        let data = p256(3);
        let public = match &data {
            KeyData::EcP256 { public, .. } => KeyData::EcP256 {
                public: *public,
                private: None,
            },
            _ => unreachable!(),
        };
        assert!(data.has_private());
        assert!(!public.has_private());
        assert!(data.same_public_key(&public));
        assert!(!data.same_public_key(&p256(4)));
        assert_eq!(format!("{public:?}"), "EC P-256 public key");
    }

    #[test]
    fn conversions_follow_private_part() {
        let key = Key::new(p256(5)).with_name("idp");
        assert_eq!(key.name.as_deref(), Some("idp"));
        assert!(key.to_crypto_key().is_private());
        assert!(!key.to_verification_key().is_private());
        assert_eq!(key.default_signature_method(), algorithm::ECDSA_SHA256);
        assert!(key.certificate().is_none());
    }
}
