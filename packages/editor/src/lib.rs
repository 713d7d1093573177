//! # Pagecraft Editor
//!
//! The page-builder document engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ pipeline: JSON → migrate → sanitize →       │
//! │           validate → PageContent            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ session: intents → tree operations →        │
//! │          history (undo/redo, coalescing)    │
//! │  - clipboard, selection, draft preview      │
//! │  - drop resolution from pointer geometry    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ autosave: debounced snapshots → store       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Trees are values**: every operation returns a new `PageContent` or
//!    fails without side effects
//! 2. **Invariants at the boundary**: composition is checked before a
//!    mutation, structure after it
//! 3. **One writer**: a session owns its document; autosave only reads
//!    snapshots
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagecraft_editor::{EditSession, EditorConfig};
//! use pagecraft_model::kind;
//! use pagecraft_registry::Registry;
//! use std::sync::Arc;
//!
//! let mut session = EditSession::blank("home", Arc::new(Registry::builtin()), EditorConfig::default());
//! let root = session.content().root_id().clone();
//!
//! let section = session.insert_block(kind::SECTION, &root, None)?;
//! let heading = session.insert_block(kind::HEADING, &section, None)?;
//! session.cut(&heading)?;
//! session.undo()?;
//! ```

mod autosave;
mod clipboard;
mod config;
mod dnd;
mod errors;
mod migrations;
mod mutations;
mod pipeline;
mod sanitize;
mod session;
mod store;
mod undo_stack;

pub use autosave::{AutosaveHandle, SaveStatus};
pub use clipboard::{ClipboardData, ClipboardOp};
pub use config::EditorConfig;
pub use dnd::{
    DragFrame, DragSource, DropError, DropResolver, DropTarget, DropZone, Point, Rect,
    DEFAULT_SNAP_DISTANCE,
};
pub use errors::{EditorError, SessionError};
pub use migrations::{ChainError, Migration, Migrator, CURRENT_VERSION};
pub use mutations::{
    clone_subtree, insert, insert_subtree, move_node, remove, update_meta, update_props, Mutation,
    MutationError,
};
pub use pipeline::{repair_composition, validate_composition, LoadedDocument, Pipeline, PipelineError};
pub use sanitize::{sanitize_content, AllowListSanitizer, HtmlSanitizer, UrlPolicy};
pub use session::{Clock, EditSession, EditorState, Env, Intent, ManualClock, Outcome, SystemClock};
pub use store::{DocumentStore, FileStore, MemoryStore, StoreError, StoreResult};
pub use undo_stack::{CommitOutcome, CommitReason, History, DEFAULT_MAX_DEPTH};

// Re-export the model and registry for convenience
pub use pagecraft_model::validate_tree;
pub use pagecraft_registry::Registry;
