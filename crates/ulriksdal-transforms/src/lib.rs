#![forbid(unsafe_code)]

//! Transform pipeline engine for ulriksdal.
//!
//! Implements the transform chain model from XML-DSig: a reference selects
//! a node set with its URI, then applies its transforms in order until the
//! data is octets ready for the digest.

pub mod enveloped;
pub mod pipeline;
pub mod uri;

pub use enveloped::EnvelopedSignatureTransform;
pub use pipeline::{C14nTransform, Transform, TransformData, TransformPipeline};

use ulriksdal_c14n::C14nMode;
use ulriksdal_core::{algorithm, Error};

/// Instantiate the transform named by `uri`.
///
/// `signature` is the `<ds:Signature>` the reference belongs to, removed by
/// the enveloped-signature transform; `inclusive_prefixes` is the
/// InclusiveNamespaces PrefixList of a canonicalization transform.
pub fn from_uri(
    uri: &str,
    signature: roxmltree::NodeId,
    inclusive_prefixes: Vec<String>,
) -> Result<Box<dyn Transform>, Error> {
    if uri == algorithm::ENVELOPED_SIGNATURE {
        return Ok(Box::new(EnvelopedSignatureTransform::new(signature)));
    }
    match C14nMode::from_uri(uri) {
        Some(mode) => Ok(Box::new(C14nTransform::new(mode, inclusive_prefixes))),
        None => Err(Error::UnsupportedAlgorithm(format!("transform: {uri}"))),
    }
}
