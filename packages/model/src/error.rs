//! Error types for the document model

use crate::ids::NodeId;
use thiserror::Error;

/// A persisted document could not be decoded
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Node stored under key {key} declares id {id}")]
    IdMismatch { key: NodeId, id: NodeId },

    #[error("Root node {0} is not present")]
    MissingRoot(NodeId),

    #[error("Props of {node_id} do not match kind '{kind}': {source}")]
    InvalidProps {
        node_id: NodeId,
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Document version {found} is newer than supported version {current}")]
    UnsupportedVersion { found: u32, current: u32 },
}
