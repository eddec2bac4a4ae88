#![forbid(unsafe_code)]

//! NodeSet type for XML canonicalization and transforms.
//!
//! A `NodeSet` represents a document subset, identified by `NodeId`.  The
//! reference-processing model of XML-DSig turns a same-document URI into
//! such a subset, and the enveloped-signature transform removes a subtree
//! from it before canonicalization.

use roxmltree::{Document, Node, NodeId, NodeType};
use std::collections::HashSet;

/// A set of XML document nodes identified by `NodeId`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSet {
    nodes: HashSet<NodeId>,
}

impl NodeSet {
    /// Create an empty node set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node set containing every node in the document.
    pub fn all(doc: &Document<'_>) -> Self {
        Self {
            nodes: doc.descendants().map(|n| n.id()).collect(),
        }
    }

    /// Create a node set of the whole document without comment nodes.
    /// `URI=""` selects the document this way.
    pub fn all_without_comments(doc: &Document<'_>) -> Self {
        Self::tree(doc.root(), false)
    }

    /// Create a node set for the subtree rooted at `root`.
    pub fn tree(root: Node<'_, '_>, with_comments: bool) -> Self {
        let nodes = root
            .descendants()
            .filter(|n| with_comments || n.node_type() != NodeType::Comment)
            .map(|n| n.id())
            .collect();
        Self { nodes }
    }

    /// Check if a node is in this set.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// Add a node to this set.
    pub fn insert(&mut self, id: NodeId) {
        self.nodes.insert(id);
    }

    /// Remove `root` and all of its descendants from this set.
    pub fn remove_subtree(&mut self, root: Node<'_, '_>) {
        for node in root.descendants() {
            self.nodes.remove(&node.id());
        }
    }

    /// Check if this set is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes in the set.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
