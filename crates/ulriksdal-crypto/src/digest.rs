#![forbid(unsafe_code)]

//! Digest (hash) algorithm implementations.

use digest::Digest;
use ulriksdal_core::{algorithm, Error};

/// Trait for digest algorithms.
pub trait DigestAlgorithm: Send {
    /// Feed data into the hash.
    fn update(&mut self, data: &[u8]);
    /// Finalize and return the hash value.
    fn finalize(self: Box<Self>) -> Vec<u8>;
    /// Algorithm URI.
    fn uri(&self) -> &'static str;
}

/// Create a digest algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn DigestAlgorithm>, Error> {
    match uri {
        algorithm::SHA1 => Ok(Box::new(Hasher::<sha1::Sha1>::new(algorithm::SHA1))),
        algorithm::SHA256 => Ok(Box::new(Hasher::<sha2::Sha256>::new(algorithm::SHA256))),
        algorithm::SHA384 => Ok(Box::new(Hasher::<sha2::Sha384>::new(algorithm::SHA384))),
        algorithm::SHA512 => Ok(Box::new(Hasher::<sha2::Sha512>::new(algorithm::SHA512))),
        _ => Err(Error::UnsupportedAlgorithm(format!("digest algorithm: {uri}"))),
    }
}

/// Compute a digest in one shot.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut hasher = from_uri(uri)?;
    hasher.update(data);
    Ok(hasher.finalize())
}

/// The digest URI paired with a signature method's hash, for callers that
/// want Reference digests to match the signature strength.
pub fn for_signature_method(signature_uri: &str) -> Option<&'static str> {
    match signature_uri {
        algorithm::RSA_SHA1 => Some(algorithm::SHA1),
        algorithm::RSA_SHA256 | algorithm::ECDSA_SHA256 => Some(algorithm::SHA256),
        algorithm::RSA_SHA384 | algorithm::ECDSA_SHA384 => Some(algorithm::SHA384),
        algorithm::RSA_SHA512 => Some(algorithm::SHA512),
        _ => None,
    }
}

struct Hasher<D> {
    inner: D,
    uri: &'static str,
}

impl<D: Digest> Hasher<D> {
    fn new(uri: &'static str) -> Self {
        Self {
            inner: D::new(),
            uri,
        }
    }
}

impl<D: Digest + Send> DigestAlgorithm for Hasher<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.inner, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.inner.finalize().to_vec()
    }

    fn uri(&self) -> &'static str {
        self.uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn known_sha256_of_hello() {
        let result = digest(algorithm::SHA256, b"hello").unwrap();
        assert_eq!(
            hex(&result),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn known_sha1_of_hello() {
        let result = digest(algorithm::SHA1, b"hello").unwrap();
        assert_eq!(hex(&result), "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
    }

    #[test]
    fn output_lengths() {
        assert_eq!(digest(algorithm::SHA384, b"x").unwrap().len(), 48);
        assert_eq!(digest(algorithm::SHA512, b"x").unwrap().len(), 64);
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut h = from_uri(algorithm::SHA256).unwrap();
        assert_eq!(h.uri(), algorithm::SHA256);
        h.update(b"hel");
        h.update(b"lo");
        assert_eq!(h.finalize(), digest(algorithm::SHA256, b"hello").unwrap());
    }

    #[test]
    fn unknown_uri_is_unsupported() {
        let err = digest("http://www.w3.org/2001/04/xmldsig-more#md5", b"x").unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn digest_for_signature_method() {
        assert_eq!(for_signature_method(algorithm::RSA_SHA256), Some(algorithm::SHA256));
        assert_eq!(for_signature_method(algorithm::ECDSA_SHA384), Some(algorithm::SHA384));
        assert_eq!(for_signature_method("urn:nope"), None);
    }
}
