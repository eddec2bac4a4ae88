#![forbid(unsafe_code)]

//! XML Digital Signature (XML-DSig) implementation.
//!
//! Builds enveloped `<ds:Signature>` templates, fills them in, and checks
//! them again.

pub mod context;
pub mod sign;
pub mod template;
pub mod verify;

pub use context::DsigContext;
pub use template::SignatureTemplate;
pub use verify::VerifyResult;
