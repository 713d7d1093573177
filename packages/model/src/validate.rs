//! Structural validation of a [`PageContent`] tree.
//!
//! Checks the id-level invariants: a single root, parent/child symmetry, no
//! cycles, no dangling references. Composition legality needs the block
//! registry and is checked elsewhere.

use crate::content::PageContent;
use crate::ids::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Category of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationKind {
    Structural,
    Composition,
    ContentRule,
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub kind: ValidationKind,

    /// Node the finding is about, when there is one
    pub node_id: Option<NodeId>,

    pub message: String,

    /// Platform module the finding relates to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_key: Option<String>,
}

impl ValidationError {
    pub fn structural(node_id: Option<&NodeId>, message: impl Into<String>) -> Self {
        Self {
            kind: ValidationKind::Structural,
            node_id: node_id.cloned(),
            message: message.into(),
            module_key: None,
        }
    }

    pub fn composition(node_id: &NodeId, message: impl Into<String>) -> Self {
        Self {
            kind: ValidationKind::Composition,
            node_id: Some(node_id.clone()),
            message: message.into(),
            module_key: None,
        }
    }

    pub fn content_rule(node_id: &NodeId, message: impl Into<String>) -> Self {
        Self {
            kind: ValidationKind::ContentRule,
            node_id: Some(node_id.clone()),
            message: message.into(),
            module_key: None,
        }
    }

    pub fn with_module(mut self, module_key: impl Into<String>) -> Self {
        self.module_key = Some(module_key.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node_id {
            Some(id) => write!(f, "[{:?}] {}: {}", self.kind, id, self.message),
            None => write!(f, "[{:?}] {}", self.kind, self.message),
        }
    }
}

/// Check structural invariants and return every violation found
pub fn validate_tree(tree: &PageContent) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let root_id = tree.root_id();

    // Single root, and it is the declared one
    match tree.get(root_id) {
        None => errors.push(ValidationError::structural(
            Some(root_id),
            "root node is missing",
        )),
        Some(root) if root.parent_id.is_some() => errors.push(ValidationError::structural(
            Some(root_id),
            "root node has a parent",
        )),
        Some(_) => {}
    }
    for node in tree.nodes() {
        if node.parent_id.is_none() && &node.id != root_id {
            errors.push(ValidationError::structural(
                Some(&node.id),
                "node has no parent but is not the root",
            ));
        }
    }

    // Dangling references and parent/child symmetry, seen from the parent
    for node in tree.nodes() {
        let mut seen = HashSet::new();
        for child_id in &node.child_ids {
            if !seen.insert(child_id) {
                errors.push(ValidationError::structural(
                    Some(&node.id),
                    format!("child {} is listed more than once", child_id),
                ));
                continue;
            }
            match tree.get(child_id) {
                None => errors.push(ValidationError::structural(
                    Some(&node.id),
                    format!("child {} does not exist", child_id),
                )),
                Some(child) if child.parent_id.as_ref() != Some(&node.id) => {
                    errors.push(ValidationError::structural(
                        Some(child_id),
                        format!(
                            "listed as a child of {} but its parent is {}",
                            node.id,
                            child
                                .parent_id
                                .as_ref()
                                .map(|p| p.to_string())
                                .unwrap_or_else(|| "none".to_string())
                        ),
                    ))
                }
                Some(_) => {}
            }
        }
    }

    // ...and from the child
    for node in tree.nodes() {
        if let Some(parent_id) = &node.parent_id {
            match tree.get(parent_id) {
                None => errors.push(ValidationError::structural(
                    Some(&node.id),
                    format!("parent {} does not exist", parent_id),
                )),
                Some(parent) if !parent.child_ids.contains(&node.id) => {
                    errors.push(ValidationError::structural(
                        Some(&node.id),
                        format!("parent {} does not list this node as a child", parent_id),
                    ))
                }
                Some(_) => {}
            }
        }
    }

    // Cycles: walk up from every node; a repeated id means a loop
    let mut reported = HashSet::new();
    for node in tree.nodes() {
        let mut path = HashSet::new();
        path.insert(&node.id);
        let mut current = node.parent_id.as_ref();
        while let Some(id) = current {
            if !path.insert(id) {
                if reported.insert(id.clone()) {
                    errors.push(ValidationError::structural(
                        Some(id),
                        "node is reachable from itself",
                    ));
                }
                break;
            }
            current = tree.get(id).and_then(|n| n.parent_id.as_ref());
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::BlockNode;
    use crate::props::kind;

    fn node(id: &str, kind: &str, parent: Option<&str>, children: &[&str]) -> BlockNode {
        let mut n = BlockNode::of_kind(id, kind);
        n.parent_id = parent.map(NodeId::new);
        n.child_ids = children.iter().map(|c| NodeId::new(*c)).collect();
        n
    }

    #[test]
    fn test_valid_tree_has_no_errors() {
        let tree = PageContent::from_parts(
            NodeId::new("r"),
            vec![
                node("r", kind::PAGE, None, &["s"]),
                node("s", kind::SECTION, Some("r"), &["t"]),
                node("t", kind::TEXT, Some("s"), &[]),
            ],
        );
        assert!(validate_tree(&tree).is_empty());
    }

    #[test]
    fn test_dangling_child_is_reported() {
        let tree = PageContent::from_parts(
            NodeId::new("r"),
            vec![node("r", kind::PAGE, None, &["ghost"])],
        );
        let errors = validate_tree(&tree);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("does not exist"));
    }

    #[test]
    fn test_second_root_is_reported() {
        let tree = PageContent::from_parts(
            NodeId::new("r"),
            vec![
                node("r", kind::PAGE, None, &[]),
                node("x", kind::SECTION, None, &[]),
            ],
        );
        let errors = validate_tree(&tree);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].node_id, Some(NodeId::new("x")));
    }

    #[test]
    fn test_cycle_is_reported() {
        let tree = PageContent::from_parts(
            NodeId::new("r"),
            vec![
                node("r", kind::PAGE, None, &[]),
                node("a", kind::SECTION, Some("b"), &["b"]),
                node("b", kind::SECTION, Some("a"), &["a"]),
            ],
        );
        let errors = validate_tree(&tree);
        assert!(errors
            .iter()
            .any(|e| e.message.contains("reachable from itself")));
    }

    #[test]
    fn test_asymmetric_link_is_reported() {
        let tree = PageContent::from_parts(
            NodeId::new("r"),
            vec![
                node("r", kind::PAGE, None, &["a"]),
                node("a", kind::SECTION, Some("r"), &[]),
                node("b", kind::SECTION, Some("a"), &[]),
            ],
        );
        let errors = validate_tree(&tree);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].node_id, Some(NodeId::new("b")));
    }
}
