//! Error types for the editor

use crate::dnd::DropError;
use crate::mutations::MutationError;
use crate::pipeline::PipelineError;
use crate::store::StoreError;
use pagecraft_model::{FormatError, NodeId};
use thiserror::Error;

/// Why the session rejected an intent. The committed tree and history are
/// untouched whenever one of these is returned.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error("Block {0} is locked")]
    Locked(NodeId),

    #[error(transparent)]
    Drop(#[from] DropError),

    #[error("Unknown block kind '{0}'")]
    UnknownKind(String),
}

impl SessionError {
    /// Recoverable errors are shown inline; the rest indicate a bug
    pub fn is_recoverable(&self) -> bool {
        match self {
            SessionError::Mutation(e) => e.is_recoverable(),
            _ => true,
        }
    }
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Autosave worker has stopped")]
    AutosaveStopped,
}
