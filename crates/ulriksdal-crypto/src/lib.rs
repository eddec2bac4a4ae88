#![forbid(unsafe_code)]

//! Cryptographic algorithm implementations for ulriksdal.
//!
//! Digests and signatures are looked up by their XML-DSig algorithm URI,
//! so the signing layer never names a concrete hash or curve.

pub mod digest;
pub mod sign;

pub use digest::DigestAlgorithm;
pub use sign::{CryptoKey, SignatureAlgorithm};
