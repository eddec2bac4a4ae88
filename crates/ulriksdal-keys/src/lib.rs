#![forbid(unsafe_code)]

//! Key management for ulriksdal: key material, PEM/DER loading of private
//! keys and X.509 certificates, signing credentials, certificate metadata
//! and `<ds:KeyInfo>` processing.

pub mod key;
pub mod keyinfo;
pub mod loader;
pub mod x509;

pub use key::{Key, KeyData};
pub use x509::CertificateInfo;
