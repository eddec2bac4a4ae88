#![forbid(unsafe_code)]

//! Enveloped signature transform.
//!
//! Removes the `<Signature>` element containing the reference, and
//! everything inside it, from the node set.

use crate::pipeline::{Transform, TransformData};
use roxmltree::NodeId;
use ulriksdal_core::{algorithm, Error};

pub struct EnvelopedSignatureTransform {
    signature: NodeId,
}

impl EnvelopedSignatureTransform {
    /// Create with the node of the Signature element to remove.
    pub fn new(signature: NodeId) -> Self {
        Self { signature }
    }
}

impl Transform for EnvelopedSignatureTransform {
    fn uri(&self) -> &str {
        algorithm::ENVELOPED_SIGNATURE
    }

    fn execute<'a, 'input>(
        &self,
        input: TransformData<'a, 'input>,
    ) -> Result<TransformData<'a, 'input>, Error> {
        match input {
            TransformData::Xml { doc, mut node_set } => {
                let signature = doc.get_node(self.signature).ok_or_else(|| {
                    Error::Transform("enveloping Signature element not found".into())
                })?;
                node_set.remove_subtree(signature);
                Ok(TransformData::Xml { doc, node_set })
            }
            TransformData::Binary(_) => Err(Error::Transform(
                "enveloped-signature transform requires XML input".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{C14nTransform, TransformPipeline};
    use ulriksdal_c14n::C14nMode;
    use ulriksdal_xml::NodeSet;

    const DOC: &str = r#"<a:Assertion xmlns:a="urn:a" ID="_1"><a:Issuer>me</a:Issuer><ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:SignedInfo/></ds:Signature><a:Subject/></a:Assertion>"#;

    #[test]
    fn signature_is_removed_before_canonicalization() {
        let doc = ulriksdal_xml::parse(DOC).unwrap();
        let sig = doc
            .descendants()
            .find(|n| n.tag_name().name() == "Signature")
            .unwrap();

        let mut pipeline = TransformPipeline::new();
        pipeline.push(Box::new(EnvelopedSignatureTransform::new(sig.id())));
        pipeline.push(Box::new(C14nTransform::new(C14nMode::Exclusive, Vec::new())));
        assert_eq!(
            pipeline.uris(),
            [algorithm::ENVELOPED_SIGNATURE, algorithm::EXC_C14N]
        );

        let out = pipeline
            .execute(TransformData::Xml {
                doc: &doc,
                node_set: NodeSet::tree(doc.root_element(), false),
            })
            .unwrap()
            .into_binary()
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<a:Assertion xmlns:a="urn:a" ID="_1"><a:Issuer>me</a:Issuer><a:Subject></a:Subject></a:Assertion>"#
        );
    }

    #[test]
    fn binary_input_is_rejected() {
        let doc = ulriksdal_xml::parse(DOC).unwrap();
        let t = EnvelopedSignatureTransform::new(doc.root_element().id());
        assert!(t.execute(TransformData::Binary(Vec::new())).is_err());
    }
}
