//! # Page Content
//!
//! The normalized document tree. A flat id-keyed map of nodes is the single
//! source of truth; parent/child relationships are expressed through ids only.
//!
//! Nodes are held behind `Arc` so cloning a `PageContent` (for history
//! snapshots) shares every node that has not been modified since.
//!
//! The low-level mutators on this type (`node_mut`, `put`, `take`) do not
//! uphold tree invariants on their own; the editor's tree operations use them
//! and re-validate before handing a tree back.

use crate::ids::{IdGenerator, NodeId};
use crate::node::BlockNode;
use crate::props::{kind, BlockProps, PageProps};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Whole page document: root id plus every node keyed by id
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    root_id: NodeId,
    nodes: HashMap<NodeId, Arc<BlockNode>>,
}

impl PageContent {
    /// Create a document containing only `root`
    pub fn new(mut root: BlockNode) -> Self {
        root.parent_id = None;
        root.child_ids.clear();
        let root_id = root.id.clone();
        let mut nodes = HashMap::new();
        nodes.insert(root_id.clone(), Arc::new(root));
        Self { root_id, nodes }
    }

    /// Default document: an empty `page` root
    pub fn with_default_root(root_id: impl Into<NodeId>) -> Self {
        Self::new(BlockNode::new(root_id, BlockProps::Page(PageProps::default())))
    }

    /// Assemble a document from parts without any checking
    pub fn from_parts(root_id: NodeId, nodes: impl IntoIterator<Item = BlockNode>) -> Self {
        Self {
            root_id,
            nodes: nodes
                .into_iter()
                .map(|n| (n.id.clone(), Arc::new(n)))
                .collect(),
        }
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root_id
    }

    pub fn root(&self) -> Option<&BlockNode> {
        self.get(&self.root_id)
    }

    pub fn get(&self, id: &NodeId) -> Option<&BlockNode> {
        self.nodes.get(id).map(|n| n.as_ref())
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes in arbitrary order
    pub fn nodes(&self) -> impl Iterator<Item = &BlockNode> {
        self.nodes.values().map(|n| n.as_ref())
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Children of `id`, empty when the node is missing
    pub fn children(&self, id: &NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.child_ids.as_slice()).unwrap_or(&[])
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.get(id).and_then(|n| n.parent_id.as_ref())
    }

    /// Position of `id` within its parent's children
    pub fn index_in_parent(&self, id: &NodeId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.children(parent).iter().position(|c| c == id)
    }

    /// Ancestors of `id`, nearest first. Stops on a repeated id so a corrupt
    /// tree cannot loop forever.
    pub fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            if !seen.insert(parent.clone()) {
                break;
            }
            out.push(parent.clone());
            current = self.parent_of(parent);
        }
        out
    }

    /// True when `candidate` is `ancestor` itself or lies beneath it
    pub fn is_within(&self, candidate: &NodeId, ancestor: &NodeId) -> bool {
        candidate == ancestor || self.ancestors(candidate).iter().any(|a| a == ancestor)
    }

    /// Number of edges between the root and `id`
    pub fn depth(&self, id: &NodeId) -> usize {
        self.ancestors(id).len()
    }

    /// `id` and all of its descendants in document (pre-)order
    pub fn descendants(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if !self.contains(&current) || !seen.insert(current.clone()) {
                continue;
            }
            for child in self.children(&current).iter().rev() {
                stack.push(child.clone());
            }
            out.push(current);
        }
        out
    }

    /// Copy the subtree rooted at `id`, keeping its ids, detached from its parent
    pub fn extract_subtree(&self, id: &NodeId) -> Option<Subtree> {
        if !self.contains(id) {
            return None;
        }
        let mut nodes = HashMap::new();
        for node_id in self.descendants(id) {
            if let Some(node) = self.get(&node_id) {
                nodes.insert(node_id, node.clone());
            }
        }
        if let Some(root) = nodes.get_mut(id) {
            root.parent_id = None;
        }
        Some(Subtree {
            root_id: id.clone(),
            nodes,
        })
    }

    /// Mutable access to a node (copy-on-write when shared with a snapshot)
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut BlockNode> {
        self.nodes.get_mut(id).map(Arc::make_mut)
    }

    /// Insert or replace a node by its id
    pub fn put(&mut self, node: BlockNode) {
        self.nodes.insert(node.id.clone(), Arc::new(node));
    }

    /// Remove a node entry, leaving any references to it in place
    pub fn take(&mut self, id: &NodeId) -> Option<BlockNode> {
        self.nodes
            .remove(id)
            .map(|n| Arc::try_unwrap(n).unwrap_or_else(|shared| (*shared).clone()))
    }
}

/// A detached tree of nodes: one root plus its transitive descendants
#[derive(Debug, Clone, PartialEq)]
pub struct Subtree {
    root_id: NodeId,
    nodes: HashMap<NodeId, BlockNode>,
}

impl Subtree {
    /// A subtree made of a single leaf
    pub fn single(mut node: BlockNode) -> Self {
        node.parent_id = None;
        let root_id = node.id.clone();
        let mut nodes = HashMap::new();
        nodes.insert(root_id.clone(), node);
        Self { root_id, nodes }
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root_id
    }

    pub fn root(&self) -> Option<&BlockNode> {
        self.nodes.get(&self.root_id)
    }

    pub fn get(&self, id: &NodeId) -> Option<&BlockNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &BlockNode> {
        self.nodes.values()
    }

    /// Kind of the subtree's root
    pub fn root_kind(&self) -> &str {
        self.root().map(|n| n.kind()).unwrap_or(kind::PAGE)
    }

    /// Copy with every id replaced by a fresh one, links rewritten to match
    pub fn rekeyed(&self, ids: &mut IdGenerator) -> Subtree {
        // Deterministic order keeps the fresh ids stable across runs
        let mut old_ids: Vec<&NodeId> = self.nodes.keys().collect();
        old_ids.sort();
        let mapping: HashMap<NodeId, NodeId> = old_ids
            .into_iter()
            .map(|old| (old.clone(), ids.next_id()))
            .collect();

        let remap = |id: &NodeId| mapping.get(id).cloned().unwrap_or_else(|| id.clone());

        let nodes = self
            .nodes
            .values()
            .map(|node| {
                let mut node = node.clone();
                node.id = remap(&node.id);
                node.parent_id = node.parent_id.as_ref().map(remap);
                node.child_ids = node.child_ids.iter().map(remap).collect();
                (node.id.clone(), node)
            })
            .collect();

        Subtree {
            root_id: remap(&self.root_id),
            nodes,
        }
    }

    pub fn into_nodes(self) -> impl Iterator<Item = BlockNode> {
        self.nodes.into_values()
    }
}
