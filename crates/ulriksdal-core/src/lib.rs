#![forbid(unsafe_code)]

//! Core types for the ulriksdal SAML signing toolkit: the shared error type,
//! namespace constants and XML-DSig algorithm identifiers.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
