use crate::document::RawBlockNode;
use crate::ids::NodeId;
use crate::props::BlockProps;
use serde::{Deserialize, Deserializer, Serialize};

/// One block in a page document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlockNode", into = "RawBlockNode")]
pub struct BlockNode {
    pub id: NodeId,

    /// Containing node, `None` only for the root
    pub parent_id: Option<NodeId>,

    /// Children in document order
    pub child_ids: Vec<NodeId>,

    /// Per-kind configuration; also determines the block's kind
    pub props: BlockProps,

    pub meta: BlockMeta,
}

impl BlockNode {
    /// Create a detached leaf node
    pub fn new(id: impl Into<NodeId>, props: BlockProps) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            child_ids: Vec::new(),
            props,
            meta: BlockMeta::default(),
        }
    }

    /// Create a detached node of `kind` with default props
    pub fn of_kind(id: impl Into<NodeId>, kind: &str) -> Self {
        Self::new(id, BlockProps::default_for(kind))
    }

    pub fn with_meta(mut self, meta: BlockMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Block kind key
    pub fn kind(&self) -> &str {
        self.props.kind()
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Editor-only annotations. They never change what is rendered, but they do
/// change what the editor lets the user do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlockMeta {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl BlockMeta {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Apply a patch, returning the merged annotations
    pub fn merged(&self, patch: &MetaPatch) -> Self {
        Self {
            hidden: patch.hidden.unwrap_or(self.hidden),
            locked: patch.locked.unwrap_or(self.locked),
            label: match &patch.label {
                Some(label) => label.clone(),
                None => self.label.clone(),
            },
        }
    }
}

/// Shallow patch for [`BlockMeta`]; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetaPatch {
    pub hidden: Option<bool>,
    pub locked: Option<bool>,
    /// `Some(None)` clears the label; on the wire that is `"label": null`
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub label: Option<Option<String>>,
}

/// Keep an explicit `null` apart from a missing field; `default` covers the latter
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl MetaPatch {
    pub fn hidden(hidden: bool) -> Self {
        Self {
            hidden: Some(hidden),
            ..Self::default()
        }
    }

    pub fn locked(locked: bool) -> Self {
        Self {
            locked: Some(locked),
            ..Self::default()
        }
    }

    pub fn label(label: Option<String>) -> Self {
        Self {
            label: Some(label),
            ..Self::default()
        }
    }
}
