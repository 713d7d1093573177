//! # Wire Format
//!
//! The persisted, JSON-shaped document:
//!
//! ```text
//! { "version": 3, "rootId": "r", "nodes": { "r": { "id": "r", "type": "page", ... } } }
//! ```
//!
//! Props stay untyped at this level so migrations can reshape documents
//! written by older versions before they are typed into [`PageContent`].

use crate::content::PageContent;
use crate::error::FormatError;
use crate::ids::NodeId;
use crate::node::{BlockMeta, BlockNode};
use crate::props::BlockProps;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A persisted document with untyped props
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    /// Shape version; drives migration on load
    pub version: u32,
    pub root_id: NodeId,
    pub nodes: BTreeMap<NodeId, RawBlockNode>,
}

/// A persisted block with untyped props
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlockNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub child_ids: Vec<NodeId>,
    #[serde(default)]
    pub props: Value,
    #[serde(default, skip_serializing_if = "BlockMeta::is_default")]
    pub meta: BlockMeta,
}

impl RawDocument {
    /// Decode the wire format
    pub fn from_json(input: &str) -> Result<Self, FormatError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn to_json(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Snapshot a typed tree at `version`
    pub fn from_content(content: &PageContent, version: u32) -> Self {
        Self {
            version,
            root_id: content.root_id().clone(),
            nodes: content
                .nodes()
                .map(|n| (n.id.clone(), RawBlockNode::from(n.clone())))
                .collect(),
        }
    }

    /// Type every node's props. Does not check tree structure.
    pub fn into_content(self) -> Result<PageContent, FormatError> {
        if !self.nodes.contains_key(&self.root_id) {
            return Err(FormatError::MissingRoot(self.root_id));
        }

        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (key, raw) in self.nodes {
            if key != raw.id {
                return Err(FormatError::IdMismatch { key, id: raw.id });
            }
            nodes.push(BlockNode::try_from(raw)?);
        }

        Ok(PageContent::from_parts(self.root_id, nodes))
    }
}

impl TryFrom<RawBlockNode> for BlockNode {
    type Error = FormatError;

    fn try_from(raw: RawBlockNode) -> Result<Self, Self::Error> {
        let props = BlockProps::from_value(&raw.kind, raw.props).map_err(|source| {
            FormatError::InvalidProps {
                node_id: raw.id.clone(),
                kind: raw.kind.clone(),
                source,
            }
        })?;

        Ok(BlockNode {
            id: raw.id,
            parent_id: raw.parent_id,
            child_ids: raw.child_ids,
            props,
            meta: raw.meta,
        })
    }
}

impl From<BlockNode> for RawBlockNode {
    fn from(node: BlockNode) -> Self {
        RawBlockNode {
            kind: node.kind().to_string(),
            props: node.props.to_value(),
            id: node.id,
            parent_id: node.parent_id,
            child_ids: node.child_ids,
            meta: node.meta,
        }
    }
}
