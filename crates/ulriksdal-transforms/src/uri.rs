#![forbid(unsafe_code)]

//! URI resolution for XML-DSig references.
//!
//! Handles:
//! - Empty URI (""): the entire document minus comments
//! - Same-document references ("#id"): the identified subtree minus comments
//!
//! External references are rejected.

use std::collections::HashMap;
use ulriksdal_core::Error;
use ulriksdal_xml::{xpath, NodeSet};

/// Resolve a Reference URI to the node set it selects.
pub fn resolve_uri(
    uri: &str,
    doc: &roxmltree::Document<'_>,
    id_map: &HashMap<String, roxmltree::NodeId>,
) -> Result<NodeSet, Error> {
    if uri.is_empty() {
        Ok(NodeSet::all_without_comments(doc))
    } else if let Some(id) = xpath::parse_same_document_ref(uri) {
        let node = xpath::resolve_id(doc, id_map, id)?;
        Ok(NodeSet::tree(node, false))
    } else {
        Err(Error::InvalidUri(format!("external URI not supported: {uri}")))
    }
}
