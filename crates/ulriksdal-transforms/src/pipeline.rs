#![forbid(unsafe_code)]

//! Transform pipeline and trait definitions.

use ulriksdal_c14n::C14nMode;
use ulriksdal_core::Error;
use ulriksdal_xml::NodeSet;

/// Data flowing through the transform pipeline.
pub enum TransformData<'a, 'input> {
    /// A node set of a parsed document.
    Xml {
        doc: &'a roxmltree::Document<'input>,
        node_set: NodeSet,
    },
    /// Octets.
    Binary(Vec<u8>),
}

impl TransformData<'_, '_> {
    /// The final octets of a reference.
    ///
    /// Only exclusive canonicalization is available, so a chain that leaves
    /// a node set (which would imply inclusive C14N) is rejected.
    pub fn into_binary(self) -> Result<Vec<u8>, Error> {
        match self {
            TransformData::Binary(data) => Ok(data),
            TransformData::Xml { .. } => Err(Error::Transform(
                "transform chain must end with exclusive canonicalization".into(),
            )),
        }
    }
}

/// Trait for individual transforms.
pub trait Transform: Send + Sync {
    /// The algorithm URI for this transform.
    fn uri(&self) -> &str;

    /// Execute the transform on the given data.
    fn execute<'a, 'input>(
        &self,
        input: TransformData<'a, 'input>,
    ) -> Result<TransformData<'a, 'input>, Error>;
}

/// A pipeline of transforms executed in sequence.
#[derive(Default)]
pub struct TransformPipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transform to the pipeline.
    pub fn push(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    /// Execute all transforms in order.
    pub fn execute<'a, 'input>(
        &self,
        input: TransformData<'a, 'input>,
    ) -> Result<TransformData<'a, 'input>, Error> {
        self.transforms
            .iter()
            .try_fold(input, |data, transform| transform.execute(data))
    }

    /// Algorithm URIs, in execution order.
    pub fn uris(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.uri()).collect()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

// ── C14N Transform ───────────────────────────────────────────────────

/// A canonicalization transform.
pub struct C14nTransform {
    mode: C14nMode,
    inclusive_prefixes: Vec<String>,
}

impl C14nTransform {
    pub fn new(mode: C14nMode, inclusive_prefixes: Vec<String>) -> Self {
        Self {
            mode,
            inclusive_prefixes,
        }
    }
}

impl Transform for C14nTransform {
    fn uri(&self) -> &str {
        self.mode.uri()
    }

    fn execute<'a, 'input>(
        &self,
        input: TransformData<'a, 'input>,
    ) -> Result<TransformData<'a, 'input>, Error> {
        match input {
            TransformData::Xml { doc, node_set } => {
                let bytes = ulriksdal_c14n::canonicalize_doc(
                    doc,
                    self.mode,
                    Some(&node_set),
                    &self.inclusive_prefixes,
                )?;
                Ok(TransformData::Binary(bytes))
            }
            TransformData::Binary(data) => {
                let text = std::str::from_utf8(&data)
                    .map_err(|e| Error::Transform(format!("invalid UTF-8: {e}")))?;
                let bytes = ulriksdal_c14n::canonicalize(
                    text,
                    self.mode,
                    None,
                    &self.inclusive_prefixes,
                )?;
                Ok(TransformData::Binary(bytes))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c14n_turns_node_set_into_octets() {
        let doc = ulriksdal_xml::parse(r#"<a xmlns:x="urn:x"><b/></a>"#).unwrap();
        let b = doc.root_element().first_element_child().unwrap();
        let mut pipeline = TransformPipeline::new();
        pipeline.push(Box::new(C14nTransform::new(C14nMode::Exclusive, Vec::new())));
        let out = pipeline
            .execute(TransformData::Xml {
                doc: &doc,
                node_set: NodeSet::tree(b, false),
            })
            .unwrap()
            .into_binary()
            .unwrap();
        assert_eq!(out, b"<b></b>");
    }

    #[test]
    fn binary_input_is_reparsed() {
        let t = C14nTransform::new(C14nMode::Exclusive, Vec::new());
        let out = t
            .execute(TransformData::Binary(b"<a  z='1' b='2'/>".to_vec()))
            .unwrap()
            .into_binary()
            .unwrap();
        assert_eq!(out, br#"<a b="2" z="1"></a>"#);
    }

    #[test]
    fn node_set_result_is_an_error() {
        let doc = ulriksdal_xml::parse("<a/>").unwrap();
        let data = TransformPipeline::new()
            .execute(TransformData::Xml {
                doc: &doc,
                node_set: NodeSet::all(&doc),
            })
            .unwrap();
        assert!(matches!(data.into_binary(), Err(Error::Transform(_))));
    }
}
