//! # Pagecraft Model
//!
//! Document model for the page builder: the normalized block tree, typed
//! per-kind props, the persisted wire format, and structural validation.
//!
//! ```text
//! RawDocument (wire, untyped props)
//!        ↓ into_content
//! PageContent { root_id, nodes: id → BlockNode }
//!        ↓ validate_tree
//! Vec<ValidationError>
//! ```

pub mod content;
pub mod document;
pub mod error;
pub mod ids;
pub mod node;
pub mod props;
pub mod validate;

pub use content::{PageContent, Subtree};
pub use document::{RawBlockNode, RawDocument};
pub use error::FormatError;
pub use ids::{document_seed, IdGenerator, NodeId};
pub use node::{BlockMeta, BlockNode, MetaPatch};
pub use props::{kind, BlockProps, FieldKind, PropsPatch};
pub use validate::{validate_tree, ValidationError, ValidationKind};
