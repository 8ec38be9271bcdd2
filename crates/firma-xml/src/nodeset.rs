#![forbid(unsafe_code)]

//! NodeSet type for document-subset canonicalization.
//!
//! A `NodeSet` names the nodes of one parsed document that take part in
//! canonicalization. Reference processing builds it from a same-document
//! URI and then narrows it with the enveloped-signature transform.

use roxmltree::{Document, Node, NodeId};
use std::collections::HashSet;

/// A set of nodes from a single parsed document.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: HashSet<NodeId>,
}

impl NodeSet {
    /// Create an empty node set.
    pub fn new() -> Self {
        Self::default()
    }

    /// All nodes of the document except comments.
    ///
    /// Per XML-DSig, `URI=""` selects the document without comments.
    pub fn all_without_comments(doc: &Document<'_>) -> Self {
        Self::tree_without_comments(doc.root())
    }

    /// The subtree rooted at `root`, comments excluded.
    pub fn tree_without_comments(root: Node<'_, '_>) -> Self {
        let nodes = root
            .descendants()
            .filter(|n| !n.is_comment())
            .map(|n| n.id())
            .collect();
        Self { nodes }
    }

    /// The subtree rooted at `root`, comments included.
    pub fn tree_with_comments(root: Node<'_, '_>) -> Self {
        Self {
            nodes: root.descendants().map(|n| n.id()).collect(),
        }
    }

    /// Check if a node is in this set.
    pub fn contains(&self, node: &Node<'_, '_>) -> bool {
        self.nodes.contains(&node.id())
    }

    /// Remove `root` and all of its descendants.
    pub fn remove_subtree(&mut self, root: Node<'_, '_>) {
        for n in root.descendants() {
            self.nodes.remove(&n.id());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
