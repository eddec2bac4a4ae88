#![forbid(unsafe_code)]

//! DSig context: configuration for signature operations.

use ulriksdal_c14n::C14nMode;
use ulriksdal_core::algorithm;

/// Context for XML-DSig operations.
///
/// The default canonicalizes with Exclusive C14N, digests with SHA-256,
/// signs with the key's default method and embeds the signing certificate.
#[derive(Debug, Clone)]
pub struct DsigContext {
    /// Canonicalization for `<SignedInfo>` and the reference transform.
    pub c14n_mode: C14nMode,
    /// Digest method URI for new references.
    pub digest_method: String,
    /// Signature method URI; `None` picks the key's default.
    pub signature_method: Option<String>,
    /// Publish the signing certificate in `<ds:KeyInfo>`.
    pub embed_certificate: bool,
    /// Additional ID attribute names to register.
    pub id_attrs: Vec<String>,
}

impl Default for DsigContext {
    fn default() -> Self {
        Self {
            c14n_mode: C14nMode::Exclusive,
            digest_method: algorithm::SHA256.to_owned(),
            signature_method: None,
            embed_certificate: true,
            id_attrs: Vec::new(),
        }
    }
}

impl DsigContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_digest_method(mut self, uri: impl Into<String>) -> Self {
        self.digest_method = uri.into();
        self
    }

    pub fn with_signature_method(mut self, uri: impl Into<String>) -> Self {
        self.signature_method = Some(uri.into());
        self
    }

    pub fn with_key_info(mut self, embed: bool) -> Self {
        self.embed_certificate = embed;
        self
    }

    /// Add an ID attribute name to register during processing.
    pub fn add_id_attr(&mut self, name: &str) {
        if !self.id_attrs.iter().any(|a| a == name) {
            self.id_attrs.push(name.to_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_setters() {
        let ctx = DsigContext::default();
        assert_eq!(ctx.c14n_mode, C14nMode::Exclusive);
        assert_eq!(ctx.digest_method, algorithm::SHA256);
        assert!(ctx.signature_method.is_none());
        assert!(ctx.embed_certificate);

        let mut ctx = DsigContext::new()
            .with_digest_method(algorithm::SHA1)
            .with_signature_method(algorithm::RSA_SHA1)
            .with_key_info(false);
        ctx.add_id_attr("AssertionID");
        ctx.add_id_attr("AssertionID");
        assert_eq!(ctx.digest_method, algorithm::SHA1);
        assert_eq!(ctx.signature_method.as_deref(), Some(algorithm::RSA_SHA1));
        assert!(!ctx.embed_certificate);
        assert_eq!(ctx.id_attrs, vec!["AssertionID".to_owned()]);
    }
}
