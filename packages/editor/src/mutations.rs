//! # Tree Mutations
//!
//! Pure operations over a [`PageContent`]: each takes a tree and returns a new
//! one, leaving the input untouched.
//!
//! ## Mutation Semantics
//!
//! ### Insert
//! - Parent must exist and accept the new block's kind
//! - Index is clamped to `[0, len]`
//!
//! ### Move
//! - The root never moves
//! - Fails if the new parent is the node itself or one of its descendants
//! - Within the same parent, `index` is a slot in the list *before* the node
//!   is lifted out, so dropping a node right after itself is a no-op
//!
//! ### Remove
//! - Removes the node and all descendants (no reparenting)
//!
//! Every operation validates the structural invariants of its result before
//! returning it. A violation there is a bug, reported as
//! [`MutationError::Structural`] and logged with the offending tree.

use crate::undo_stack::CommitReason;
use pagecraft_model::{
    validate_tree, BlockNode, IdGenerator, MetaPatch, NodeId, PageContent, PropsPatch, Subtree,
    ValidationError,
};
use pagecraft_registry::Registry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

/// Semantic mutations (intent-preserving operations)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Mutation {
    /// Insert a new leaf block
    #[serde(rename_all = "camelCase")]
    InsertNode {
        parent_id: NodeId,
        index: usize,
        node: BlockNode,
    },

    /// Move a block to a new parent at index
    #[serde(rename_all = "camelCase")]
    MoveNode {
        node_id: NodeId,
        new_parent_id: NodeId,
        index: usize,
    },

    /// Remove a block and its subtree
    #[serde(rename_all = "camelCase")]
    RemoveNode { node_id: NodeId },

    /// Shallow-merge into a block's props
    #[serde(rename_all = "camelCase")]
    UpdateProps { node_id: NodeId, patch: PropsPatch },

    /// Shallow-merge into a block's editor annotations
    #[serde(rename_all = "camelCase")]
    UpdateMeta { node_id: NodeId, patch: MetaPatch },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    #[error("Block '{child}' cannot be placed inside '{parent}'")]
    Composition { parent: String, child: String },

    #[error("The root block cannot be moved or removed")]
    RootImmutable,

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Node id already in use: {0}")]
    DuplicateId(NodeId),

    #[error("Invalid node: {0}")]
    InvalidNode(String),

    #[error("Invalid props for {node_id}: {message}")]
    InvalidProps { node_id: NodeId, message: String },

    #[error("Tree invariant violated: {}", summarize(.0))]
    Structural(Vec<ValidationError>),
}

impl MutationError {
    /// Recoverable errors reject the operation and leave the tree as it was.
    /// Anything else points at a bug in the engine.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, MutationError::Structural(_))
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Mutation {
    /// Apply mutation to a tree, producing the new tree
    pub fn apply(&self, tree: &PageContent, registry: &Registry) -> Result<PageContent, MutationError> {
        match self {
            Mutation::InsertNode { parent_id, index, node } => {
                insert(tree, registry, node.clone(), parent_id, *index)
            }
            Mutation::MoveNode { node_id, new_parent_id, index } => {
                move_node(tree, registry, node_id, new_parent_id, *index)
            }
            Mutation::RemoveNode { node_id } => remove(tree, node_id),
            Mutation::UpdateProps { node_id, patch } => update_props(tree, node_id, patch),
            Mutation::UpdateMeta { node_id, patch } => update_meta(tree, node_id, patch),
        }
    }

    /// The block this mutation acts on
    pub fn target(&self) -> &NodeId {
        match self {
            Mutation::InsertNode { node, .. } => &node.id,
            Mutation::MoveNode { node_id, .. }
            | Mutation::RemoveNode { node_id }
            | Mutation::UpdateProps { node_id, .. }
            | Mutation::UpdateMeta { node_id, .. } => node_id,
        }
    }

    /// History reason used when this mutation is committed on its own
    pub fn commit_reason(&self) -> CommitReason {
        match self {
            Mutation::InsertNode { .. } => CommitReason::Insert,
            Mutation::MoveNode { .. } => CommitReason::Move,
            Mutation::RemoveNode { .. } => CommitReason::Delete,
            Mutation::UpdateProps { .. } => CommitReason::EditProps,
            Mutation::UpdateMeta { .. } => CommitReason::EditMeta,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertNode { .. } => "insert",
            Mutation::MoveNode { .. } => "move",
            Mutation::RemoveNode { .. } => "remove",
            Mutation::UpdateProps { .. } => "update-props",
            Mutation::UpdateMeta { .. } => "update-meta",
        }
    }
}

/// Insert a detached leaf under `parent_id` at `index`
pub fn insert(
    tree: &PageContent,
    registry: &Registry,
    node: BlockNode,
    parent_id: &NodeId,
    index: usize,
) -> Result<PageContent, MutationError> {
    if !node.child_ids.is_empty() {
        return Err(MutationError::InvalidNode(format!(
            "{} has children; insert a subtree instead",
            node.id
        )));
    }
    insert_subtree(tree, registry, Subtree::single(node), parent_id, index)
}

/// Attach a detached subtree under `parent_id` at `index`
pub fn insert_subtree(
    tree: &PageContent,
    registry: &Registry,
    subtree: Subtree,
    parent_id: &NodeId,
    index: usize,
) -> Result<PageContent, MutationError> {
    let parent = tree
        .get(parent_id)
        .ok_or_else(|| MutationError::NotFound(parent_id.clone()))?;

    check_composition(registry, parent.kind(), subtree.root_kind())?;

    if let Some(taken) = subtree.ids().find(|id| tree.contains(id)) {
        return Err(MutationError::DuplicateId(taken.clone()));
    }

    let root_id = subtree.root_id().clone();
    let mut next = tree.clone();
    for mut node in subtree.into_nodes() {
        if node.id == root_id {
            node.parent_id = Some(parent_id.clone());
        }
        next.put(node);
    }

    let children = &mut next
        .node_mut(parent_id)
        .ok_or_else(|| MutationError::NotFound(parent_id.clone()))?
        .child_ids;
    let at = index.min(children.len());
    children.insert(at, root_id.clone());

    debug!(node_id = %root_id, parent_id = %parent_id, index = at, "Inserted block");
    checked(next, "insert")
}

/// Move `node_id` under `new_parent_id` at `new_index`
pub fn move_node(
    tree: &PageContent,
    registry: &Registry,
    node_id: &NodeId,
    new_parent_id: &NodeId,
    new_index: usize,
) -> Result<PageContent, MutationError> {
    if node_id == tree.root_id() {
        return Err(MutationError::RootImmutable);
    }
    let node = tree
        .get(node_id)
        .ok_or_else(|| MutationError::NotFound(node_id.clone()))?;
    let new_parent = tree
        .get(new_parent_id)
        .ok_or_else(|| MutationError::NotFound(new_parent_id.clone()))?;

    if tree.is_within(new_parent_id, node_id) {
        return Err(MutationError::CycleDetected);
    }
    check_composition(registry, new_parent.kind(), node.kind())?;

    let old_parent_id = node
        .parent_id
        .clone()
        .ok_or_else(|| MutationError::InvalidNode(format!("{} has no parent", node_id)))?;
    let old_index = tree
        .index_in_parent(node_id)
        .ok_or_else(|| MutationError::InvalidNode(format!("{} is not listed by its parent", node_id)))?;

    // Lifting the node out shifts later siblings left by one
    let target_index = if &old_parent_id == new_parent_id && old_index < new_index {
        new_index - 1
    } else {
        new_index
    };

    let mut next = tree.clone();
    if let Some(old_parent) = next.node_mut(&old_parent_id) {
        old_parent.child_ids.remove(old_index);
    }
    let children = &mut next
        .node_mut(new_parent_id)
        .ok_or_else(|| MutationError::NotFound(new_parent_id.clone()))?
        .child_ids;
    let at = target_index.min(children.len());
    children.insert(at, node_id.clone());

    if &old_parent_id != new_parent_id {
        if let Some(moved) = next.node_mut(node_id) {
            moved.parent_id = Some(new_parent_id.clone());
        }
    }

    debug!(node_id = %node_id, from = %old_parent_id, to = %new_parent_id, index = at, "Moved block");
    checked(next, "move")
}

/// Remove `node_id` and its whole subtree
pub fn remove(tree: &PageContent, node_id: &NodeId) -> Result<PageContent, MutationError> {
    if node_id == tree.root_id() {
        return Err(MutationError::RootImmutable);
    }
    let node = tree
        .get(node_id)
        .ok_or_else(|| MutationError::NotFound(node_id.clone()))?;
    let parent_id = node.parent_id.clone();

    let doomed = tree.descendants(node_id);
    let mut next = tree.clone();
    for id in &doomed {
        next.take(id);
    }
    if let Some(parent) = parent_id.as_ref() {
        if let Some(parent) = next.node_mut(parent) {
            parent.child_ids.retain(|c| c != node_id);
        }
    }

    debug!(node_id = %node_id, removed = doomed.len(), "Removed block");
    checked(next, "remove")
}

/// Detached copy of the subtree at `node_id` with every id freshly minted
pub fn clone_subtree(
    tree: &PageContent,
    node_id: &NodeId,
    ids: &mut IdGenerator,
) -> Result<Subtree, MutationError> {
    let subtree = tree
        .extract_subtree(node_id)
        .ok_or_else(|| MutationError::NotFound(node_id.clone()))?;
    Ok(subtree.rekeyed(ids))
}

/// Shallow-merge `patch` into the props of `node_id`
pub fn update_props(
    tree: &PageContent,
    node_id: &NodeId,
    patch: &PropsPatch,
) -> Result<PageContent, MutationError> {
    let node = tree
        .get(node_id)
        .ok_or_else(|| MutationError::NotFound(node_id.clone()))?;
    let props = node
        .props
        .merged(patch)
        .map_err(|e| MutationError::InvalidProps {
            node_id: node_id.clone(),
            message: e.to_string(),
        })?;

    let mut next = tree.clone();
    if let Some(node) = next.node_mut(node_id) {
        node.props = props;
    }
    checked(next, "update-props")
}

/// Shallow-merge `patch` into the editor annotations of `node_id`
pub fn update_meta(
    tree: &PageContent,
    node_id: &NodeId,
    patch: &MetaPatch,
) -> Result<PageContent, MutationError> {
    let node = tree
        .get(node_id)
        .ok_or_else(|| MutationError::NotFound(node_id.clone()))?;
    let meta = node.meta.merged(patch);

    let mut next = tree.clone();
    if let Some(node) = next.node_mut(node_id) {
        node.meta = meta;
    }
    checked(next, "update-meta")
}

fn check_composition(registry: &Registry, parent: &str, child: &str) -> Result<(), MutationError> {
    if registry.can_contain(parent, child) {
        Ok(())
    } else {
        Err(MutationError::Composition {
            parent: parent.to_string(),
            child: child.to_string(),
        })
    }
}

/// Hand back `tree` only if its structural invariants hold
fn checked(tree: PageContent, operation: &'static str) -> Result<PageContent, MutationError> {
    let errors = validate_tree(&tree);
    if errors.is_empty() {
        return Ok(tree);
    }
    error!(
        operation,
        root_id = %tree.root_id(),
        nodes = tree.len(),
        errors = ?errors,
        tree = ?tree,
        "Tree operation produced an invalid tree"
    );
    Err(MutationError::Structural(errors))
}
