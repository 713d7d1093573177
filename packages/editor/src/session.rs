//! # Edit Session
//!
//! The editing state machine. [`EditorState`] is a plain value advanced by a
//! reducer, `(state, intent) → (state, outcome)`; [`EditSession`] wraps it
//! with the registry, a clock, configuration, and optional autosave.
//!
//! A rejected intent leaves the committed tree, the history stacks, the
//! clipboard, and the id generator exactly as they were.

use crate::autosave::{AutosaveHandle, SaveStatus};
use crate::clipboard::ClipboardData;
use crate::config::EditorConfig;
use crate::dnd::{DragFrame, DragSource, DropResolver, DropTarget};
use crate::errors::{EditorError, SessionError};
use crate::mutations::{clone_subtree, insert_subtree, move_node, Mutation, MutationError};
use crate::pipeline::{repair_composition, Pipeline};
use crate::store::DocumentStore;
use crate::undo_stack::{CommitOutcome, CommitReason, History};
use pagecraft_linter::PublishReport;
use pagecraft_model::{
    BlockNode, IdGenerator, MetaPatch, NodeId, PageContent, PropsPatch, RawDocument, Subtree,
    ValidationError,
};
use pagecraft_registry::Registry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Monotonic time source for coalescing decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall clock, measured from construction
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Everything a user can ask the editor to do
#[derive(Debug, Clone)]
pub enum Intent {
    /// Apply a tree operation and commit it. Without a reason the
    /// mutation's own reason is used.
    Edit {
        mutation: Mutation,
        reason: Option<CommitReason>,
    },
    /// Insert a palette block with default props
    InsertBlock {
        kind: String,
        parent_id: NodeId,
        index: Option<usize>,
    },
    /// Complete a drag at a resolved target
    Drop { source: DragSource, target: DropTarget },
    /// Copy a block and place the copy right after it
    Duplicate(NodeId),
    Copy(NodeId),
    Cut(NodeId),
    /// Paste the clipboard at the end of `parent_id`
    Paste { parent_id: NodeId },
    /// Paste a subtree from outside the editor at the end of `parent_id`
    PasteFragment { subtree: Subtree, parent_id: NodeId },
    /// Apply a mutation to the draft without committing
    Preview(Mutation),
    /// Commit the draft
    Commit(CommitReason),
    DiscardDraft,
    Undo,
    Redo,
    Select(Option<NodeId>),
    /// Remove every block that breaks a composition rule
    RepairComposition,
}

impl Intent {
    pub fn edit(mutation: Mutation) -> Self {
        Intent::Edit {
            mutation,
            reason: None,
        }
    }

    pub fn edit_as(mutation: Mutation, reason: CommitReason) -> Self {
        Intent::Edit {
            mutation,
            reason: Some(reason),
        }
    }
}

/// What an accepted intent did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Committed {
        reason: CommitReason,
        /// Merged into the previous undo step
        coalesced: bool,
        /// Root of a newly created block or subtree
        created: Option<NodeId>,
        /// A staged draft was dropped in favor of this edit
        discarded_draft: bool,
    },
    /// The intent produced the tree already committed
    Unchanged,
    Previewed,
    /// The draft was dropped; when an edit reports this it changed nothing else
    DraftDiscarded,
    Undone,
    Redone,
    NothingToUndo,
    NothingToRedo,
    Copied,
    ClipboardEmpty,
    /// The target cannot hold the clipboard contents; nothing changed
    PasteRejected,
    Selected,
}

impl Outcome {
    pub fn created(&self) -> Option<&NodeId> {
        match self {
            Outcome::Committed { created, .. } => created.as_ref(),
            _ => None,
        }
    }

    pub fn changed_document(&self) -> bool {
        matches!(self, Outcome::Committed { .. } | Outcome::Undone | Outcome::Redone)
    }
}

/// Inputs the reducer reads but does not own
#[derive(Debug, Clone, Copy)]
pub struct Env<'a> {
    pub registry: &'a Registry,
    pub now: Duration,
}

/// Complete editing state
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    pub history: History,
    pub selection: Option<NodeId>,
    pub clipboard: Option<ClipboardData>,
    pub ids: IdGenerator,
    /// Bumped whenever the committed tree changes
    pub revision: u64,
}

impl EditorState {
    pub fn new(content: PageContent, config: &EditorConfig, mut ids: IdGenerator) -> Self {
        ids.reserve(content.ids());
        Self {
            history: History::with_limits(content, config.history_depth, config.coalesce_window()),
            selection: None,
            clipboard: None,
            ids,
            revision: 0,
        }
    }

    pub fn committed(&self) -> &PageContent {
        self.history.committed()
    }

    /// Advance the state machine by one intent
    pub fn reduce(mut self, intent: Intent, env: &Env<'_>) -> (Self, Result<Outcome, SessionError>) {
        let result = self.apply(intent, env);
        (self, result)
    }

    fn apply(&mut self, intent: Intent, env: &Env<'_>) -> Result<Outcome, SessionError> {
        match intent {
            Intent::Edit { mutation, reason } => {
                check_unlocked(self.committed(), &mutation)?;
                let next = mutation.apply(self.committed(), env.registry)?;
                let created = match &mutation {
                    Mutation::InsertNode { node, .. } => {
                        self.ids.reserve([&node.id]);
                        Some(node.id.clone())
                    }
                    _ => None,
                };
                let reason = reason.unwrap_or_else(|| mutation.commit_reason());
                Ok(self.commit(next, reason, env.now, created))
            }

            Intent::InsertBlock {
                kind,
                parent_id,
                index,
            } => self.insert_block(&kind, &parent_id, index, CommitReason::Insert, env),

            Intent::Drop { source, target } => match source {
                DragSource::Existing(node_id) => {
                    check_node_unlocked(self.committed(), &node_id)?;
                    let next = move_node(
                        self.committed(),
                        env.registry,
                        &node_id,
                        &target.parent_id,
                        target.index,
                    )?;
                    Ok(self.commit(next, CommitReason::Drag, env.now, None))
                }
                DragSource::Palette(kind) => self.insert_block(
                    &kind,
                    &target.parent_id,
                    Some(target.index),
                    CommitReason::Drag,
                    env,
                ),
            },

            Intent::Duplicate(node_id) => {
                let tree = self.committed();
                if !tree.contains(&node_id) {
                    return Err(MutationError::NotFound(node_id).into());
                }
                let parent_id = tree
                    .parent_of(&node_id)
                    .cloned()
                    .ok_or(MutationError::RootImmutable)?;
                let index = tree.index_in_parent(&node_id).map_or(usize::MAX, |i| i + 1);

                let mut ids = self.ids.clone();
                let copy = clone_subtree(tree, &node_id, &mut ids)?;
                let created = copy.root_id().clone();
                let next = insert_subtree(tree, env.registry, copy, &parent_id, index)?;
                self.ids = ids;
                Ok(self.commit(next, CommitReason::Duplicate, env.now, Some(created)))
            }

            Intent::Copy(node_id) => {
                let mut ids = self.ids.clone();
                let subtree = clone_subtree(self.committed(), &node_id, &mut ids)?;
                self.ids = ids;
                self.clipboard = Some(ClipboardData::copied(subtree));
                debug!(node_id = %node_id, "Copied block");
                Ok(Outcome::Copied)
            }

            Intent::Cut(node_id) => {
                check_subtree_unlocked(self.committed(), &node_id)?;
                let mut ids = self.ids.clone();
                let subtree = clone_subtree(self.committed(), &node_id, &mut ids)?;
                let next = crate::mutations::remove(self.committed(), &node_id)?;
                self.ids = ids;
                self.clipboard = Some(ClipboardData::cut(subtree));
                debug!(node_id = %node_id, "Cut block");
                Ok(self.commit(next, CommitReason::Cut, env.now, None))
            }

            Intent::Paste { parent_id } => {
                let Some(clipboard) = &self.clipboard else {
                    return Ok(Outcome::ClipboardEmpty);
                };
                let mut ids = self.ids.clone();
                let subtree = clipboard.instantiate(&mut ids);
                let outcome = self.paste(subtree, &parent_id, ids, env)?;
                if matches!(outcome, Outcome::Committed { .. }) {
                    self.clipboard = self.clipboard.take().map(ClipboardData::after_paste);
                }
                Ok(outcome)
            }

            Intent::PasteFragment { subtree, parent_id } => {
                let mut ids = self.ids.clone();
                let subtree = subtree.rekeyed(&mut ids);
                self.paste(subtree, &parent_id, ids, env)
            }

            Intent::Preview(mutation) => {
                let working = self.history.working();
                check_unlocked(working, &mutation)?;
                let next = mutation.apply(working, env.registry)?;
                self.history.stage(next);
                Ok(Outcome::Previewed)
            }

            Intent::Commit(reason) => match self.history.take_draft() {
                Some(draft) => Ok(self.commit(draft, reason, env.now, None)),
                None => Ok(Outcome::Unchanged),
            },

            Intent::DiscardDraft => Ok(if self.history.discard_draft() {
                Outcome::DraftDiscarded
            } else {
                Outcome::Unchanged
            }),

            Intent::Undo => {
                if !self.history.undo() {
                    return Ok(Outcome::NothingToUndo);
                }
                self.after_change();
                Ok(Outcome::Undone)
            }

            Intent::Redo => {
                if !self.history.redo() {
                    return Ok(Outcome::NothingToRedo);
                }
                self.after_change();
                Ok(Outcome::Redone)
            }

            Intent::Select(selection) => {
                if let Some(id) = &selection {
                    if !self.committed().contains(id) {
                        return Err(MutationError::NotFound(id.clone()).into());
                    }
                }
                self.selection = selection;
                Ok(Outcome::Selected)
            }

            Intent::RepairComposition => {
                let (next, removed) = repair_composition(self.committed(), env.registry)?;
                if !removed.is_empty() {
                    info!(removed = ?removed, "Removed blocks that break composition rules");
                }
                Ok(self.commit(next, CommitReason::Repair, env.now, None))
            }
        }
    }

    fn insert_block(
        &mut self,
        kind: &str,
        parent_id: &NodeId,
        index: Option<usize>,
        reason: CommitReason,
        env: &Env<'_>,
    ) -> Result<Outcome, SessionError> {
        let props = env
            .registry
            .default_props(kind)
            .ok_or_else(|| SessionError::UnknownKind(kind.to_string()))?;
        let mut ids = self.ids.clone();
        let node = BlockNode::new(ids.next_id(), props);
        let created = node.id.clone();
        let next = insert_subtree(
            self.committed(),
            env.registry,
            Subtree::single(node),
            parent_id,
            index.unwrap_or(usize::MAX),
        )?;
        self.ids = ids;
        Ok(self.commit(next, reason, env.now, Some(created)))
    }

    fn paste(
        &mut self,
        subtree: Subtree,
        parent_id: &NodeId,
        ids: IdGenerator,
        env: &Env<'_>,
    ) -> Result<Outcome, SessionError> {
        let tree = self.committed();
        let parent = tree
            .get(parent_id)
            .ok_or_else(|| MutationError::NotFound(parent_id.clone()))?;
        if !env.registry.can_contain(parent.kind(), subtree.root_kind()) {
            debug!(parent_id = %parent_id, kind = subtree.root_kind(), "Paste rejected");
            return Ok(Outcome::PasteRejected);
        }

        let created = subtree.root_id().clone();
        let next = insert_subtree(tree, env.registry, subtree, parent_id, usize::MAX)?;
        self.ids = ids;
        Ok(self.commit(next, CommitReason::Paste, env.now, Some(created)))
    }

    fn commit(
        &mut self,
        next: PageContent,
        reason: CommitReason,
        now: Duration,
        created: Option<NodeId>,
    ) -> Outcome {
        // Edits apply to the committed tree, so a staged draft cannot survive them
        let discarded_draft = self.history.discard_draft();
        if discarded_draft {
            warn!(reason = ?reason, "Edit committed over a pending draft; draft discarded");
        }

        match self.history.commit(next, reason, now) {
            CommitOutcome::Unchanged if discarded_draft => Outcome::DraftDiscarded,
            CommitOutcome::Unchanged => Outcome::Unchanged,
            outcome => {
                self.after_change();
                Outcome::Committed {
                    reason,
                    coalesced: outcome == CommitOutcome::Coalesced,
                    created,
                    discarded_draft,
                }
            }
        }
    }

    fn after_change(&mut self) {
        self.revision += 1;
        let gone = self
            .selection
            .as_ref()
            .is_some_and(|id| !self.history.committed().contains(id));
        if gone {
            self.selection = None;
        }
    }
}

fn check_unlocked(tree: &PageContent, mutation: &Mutation) -> Result<(), SessionError> {
    match mutation {
        Mutation::MoveNode { node_id, .. } | Mutation::UpdateProps { node_id, .. } => {
            check_node_unlocked(tree, node_id)
        }
        Mutation::RemoveNode { node_id } => check_subtree_unlocked(tree, node_id),
        Mutation::InsertNode { .. } | Mutation::UpdateMeta { .. } => Ok(()),
    }
}

fn check_node_unlocked(tree: &PageContent, node_id: &NodeId) -> Result<(), SessionError> {
    match tree.get(node_id) {
        Some(node) if node.meta.locked => Err(SessionError::Locked(node_id.clone())),
        _ => Ok(()),
    }
}

fn check_subtree_unlocked(tree: &PageContent, node_id: &NodeId) -> Result<(), SessionError> {
    for id in tree.descendants(node_id) {
        if tree.get(&id).is_some_and(|n| n.meta.locked) {
            return Err(SessionError::Locked(id));
        }
    }
    Ok(())
}

/// One open document in the editor
pub struct EditSession {
    document_id: String,
    state: EditorState,
    registry: Arc<Registry>,
    pipeline: Pipeline,
    clock: Arc<dyn Clock>,
    config: EditorConfig,
    autosave: Option<AutosaveHandle>,
}

impl EditSession {
    pub fn new(
        document_id: impl Into<String>,
        content: PageContent,
        registry: Arc<Registry>,
        config: EditorConfig,
    ) -> Self {
        let document_id = document_id.into();
        let ids = IdGenerator::new(&document_id);
        let pipeline = Pipeline::new(registry.clone()).with_url_policy(config.url_policy());
        Self {
            state: EditorState::new(content, &config, ids),
            document_id,
            registry,
            pipeline,
            clock: Arc::new(SystemClock::new()),
            config,
            autosave: None,
        }
    }

    /// A fresh document holding only a page root
    pub fn blank(document_id: impl Into<String>, registry: Arc<Registry>, config: EditorConfig) -> Self {
        let document_id = document_id.into();
        let root = IdGenerator::new(&document_id).next_id();
        Self::new(document_id, PageContent::with_default_root(root), registry, config)
    }

    /// Load a document through the content pipeline. Composition warnings
    /// are returned for the caller to repair or show.
    pub async fn open(
        store: &dyn DocumentStore,
        document_id: &str,
        registry: Arc<Registry>,
        config: EditorConfig,
    ) -> Result<(Self, Vec<ValidationError>), EditorError> {
        let raw = store.load(document_id).await?;
        let pipeline = Pipeline::new(registry.clone()).with_url_policy(config.url_policy());
        let loaded = pipeline.load_raw(raw)?;
        Ok((
            Self::new(document_id, loaded.content, registry, config),
            loaded.warnings,
        ))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Save committed snapshots to `store` in the background. Must be called
    /// inside a tokio runtime.
    pub fn with_autosave(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.autosave = Some(AutosaveHandle::spawn(
            store,
            self.document_id.clone(),
            self.config.autosave_debounce(),
        ));
        self
    }

    /// Run one intent through the reducer
    pub fn dispatch(&mut self, intent: Intent) -> Result<Outcome, SessionError> {
        let env = Env {
            registry: &self.registry,
            now: self.clock.now(),
        };
        let revision = self.state.revision;

        let (state, result) = std::mem::take(&mut self.state).reduce(intent, &env);
        self.state = state;

        if self.state.revision != revision {
            if let Some(autosave) = &self.autosave {
                autosave.schedule(self.state.revision, self.snapshot());
            }
        }
        result
    }

    pub fn apply(&mut self, mutation: Mutation) -> Result<Outcome, SessionError> {
        self.dispatch(Intent::edit(mutation))
    }

    /// Insert a palette block; returns its id
    pub fn insert_block(
        &mut self,
        kind: &str,
        parent_id: &NodeId,
        index: Option<usize>,
    ) -> Result<NodeId, SessionError> {
        let outcome = self.dispatch(Intent::InsertBlock {
            kind: kind.to_string(),
            parent_id: parent_id.clone(),
            index,
        })?;
        outcome
            .created()
            .cloned()
            .ok_or_else(|| MutationError::InvalidNode(format!("inserting '{}' created nothing", kind)).into())
    }

    pub fn move_node(&mut self, node_id: &NodeId, new_parent_id: &NodeId, index: usize) -> Result<Outcome, SessionError> {
        self.apply(Mutation::MoveNode {
            node_id: node_id.clone(),
            new_parent_id: new_parent_id.clone(),
            index,
        })
    }

    pub fn remove(&mut self, node_id: &NodeId) -> Result<Outcome, SessionError> {
        self.apply(Mutation::RemoveNode {
            node_id: node_id.clone(),
        })
    }

    pub fn update_props(&mut self, node_id: &NodeId, patch: PropsPatch) -> Result<Outcome, SessionError> {
        self.apply(Mutation::UpdateProps {
            node_id: node_id.clone(),
            patch,
        })
    }

    pub fn update_meta(&mut self, node_id: &NodeId, patch: MetaPatch) -> Result<Outcome, SessionError> {
        self.apply(Mutation::UpdateMeta {
            node_id: node_id.clone(),
            patch,
        })
    }

    pub fn duplicate(&mut self, node_id: &NodeId) -> Result<Outcome, SessionError> {
        self.dispatch(Intent::Duplicate(node_id.clone()))
    }

    pub fn copy(&mut self, node_id: &NodeId) -> Result<Outcome, SessionError> {
        self.dispatch(Intent::Copy(node_id.clone()))
    }

    pub fn cut(&mut self, node_id: &NodeId) -> Result<Outcome, SessionError> {
        self.dispatch(Intent::Cut(node_id.clone()))
    }

    pub fn paste(&mut self, parent_id: &NodeId) -> Result<Outcome, SessionError> {
        self.dispatch(Intent::Paste {
            parent_id: parent_id.clone(),
        })
    }

    /// Paste a subtree copied from another document, given in wire format
    pub fn paste_fragment(&mut self, fragment: &str, parent_id: &NodeId) -> Result<Outcome, EditorError> {
        let subtree = self.pipeline.import_fragment(fragment)?;
        Ok(self.dispatch(Intent::PasteFragment {
            subtree,
            parent_id: parent_id.clone(),
        })?)
    }

    pub fn preview(&mut self, mutation: Mutation) -> Result<Outcome, SessionError> {
        self.dispatch(Intent::Preview(mutation))
    }

    pub fn commit(&mut self, reason: CommitReason) -> Result<Outcome, SessionError> {
        self.dispatch(Intent::Commit(reason))
    }

    pub fn discard_draft(&mut self) -> Result<Outcome, SessionError> {
        self.dispatch(Intent::DiscardDraft)
    }

    pub fn undo(&mut self) -> Result<Outcome, SessionError> {
        self.dispatch(Intent::Undo)
    }

    pub fn redo(&mut self) -> Result<Outcome, SessionError> {
        self.dispatch(Intent::Redo)
    }

    pub fn select(&mut self, node_id: Option<NodeId>) -> Result<Outcome, SessionError> {
        self.dispatch(Intent::Select(node_id))
    }

    pub fn repair_composition(&mut self) -> Result<Outcome, SessionError> {
        self.dispatch(Intent::RepairComposition)
    }

    /// Where a drag would land this frame, without touching the tree
    pub fn resolve_drop(&self, source: &DragSource, frame: &DragFrame) -> Result<DropTarget, SessionError> {
        Ok(DropResolver::new(&self.registry)
            .with_snap_distance(self.config.snap_distance)
            .resolve(self.content(), source, frame)?)
    }

    /// Resolve and complete a drag in one step
    pub fn drop_at(&mut self, source: DragSource, frame: &DragFrame) -> Result<Outcome, SessionError> {
        let target = self.resolve_drop(&source, frame)?;
        self.dispatch(Intent::Drop { source, target })
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// The committed tree
    pub fn content(&self) -> &PageContent {
        self.state.committed()
    }

    /// The draft if one is staged, else the committed tree
    pub fn working(&self) -> &PageContent {
        self.state.history.working()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.state.history
    }

    pub fn selection(&self) -> Option<&NodeId> {
        self.state.selection.as_ref()
    }

    pub fn clipboard(&self) -> Option<&ClipboardData> {
        self.state.clipboard.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.state.revision
    }

    pub fn can_undo(&self) -> bool {
        self.state.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state.history.can_redo()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Component a renderer should use for `node_id`
    pub fn component_for(&self, node_id: &NodeId) -> Option<&str> {
        let node = self.content().get(node_id)?;
        self.registry.component_for(node.kind())
    }

    /// The committed tree in current-version wire format
    pub fn snapshot(&self) -> RawDocument {
        RawDocument::from_content(self.content(), self.pipeline.current_version())
    }

    pub fn publish_check(&self) -> PublishReport {
        self.pipeline
            .publish_validate(self.content(), &self.config.publish_options())
    }

    pub fn save_status(&self) -> SaveStatus {
        self.autosave
            .as_ref()
            .map_or(SaveStatus::Idle, AutosaveHandle::status)
    }

    /// Persist the latest committed snapshot now
    pub async fn flush(&self) -> Result<(), EditorError> {
        match &self.autosave {
            Some(autosave) => autosave.flush().await,
            None => Ok(()),
        }
    }

    /// End the session. History and any draft are discarded; unsaved
    /// commits are lost unless `flush` was called first.
    pub async fn close(self) {
        if let Some(autosave) = self.autosave {
            autosave.shutdown().await;
        }
        debug!(document_id = %self.document_id, "Closed edit session");
    }
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("document_id", &self.document_id)
            .field("revision", &self.state.revision)
            .field("selection", &self.state.selection)
            .field("autosave", &self.autosave.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_model::{kind, BlockProps};
    use serde_json::json;

    fn session_with(config: EditorConfig) -> (EditSession, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let session = EditSession::new(
            "doc",
            PageContent::with_default_root("root"),
            Arc::new(Registry::builtin()),
            config,
        )
        .with_clock(clock.clone());
        (session, clock)
    }

    fn session() -> (EditSession, Arc<ManualClock>) {
        session_with(EditorConfig {
            coalesce_window_ms: 0,
            ..EditorConfig::default()
        })
    }

    fn root() -> NodeId {
        NodeId::new("root")
    }

    fn patch(value: serde_json::Value) -> PropsPatch {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_insert_block_uses_defaults_and_fresh_ids() {
        let (mut s, _) = session();
        let a = s.insert_block(kind::SECTION, &root(), None).unwrap();
        let b = s.insert_block(kind::SECTION, &root(), Some(0)).unwrap();

        assert_ne!(a, b);
        assert_eq!(s.content().children(&root()), &[b, a]);
        assert_eq!(s.revision(), 2);
        assert_eq!(s.history().undo_levels(), 2);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let (mut s, _) = session();
        let err = s.insert_block("carousel", &root(), None).unwrap_err();
        assert!(matches!(err, SessionError::UnknownKind(_)));
        assert_eq!(s.revision(), 0);
    }

    #[test]
    fn test_failed_edit_leaves_state_untouched() {
        let (mut s, _) = session();
        let section = s.insert_block(kind::SECTION, &root(), None).unwrap();
        let before = s.state().clone();

        let err = s.insert_block(kind::SECTION, &section, None).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Mutation(MutationError::Composition { .. })
        ));
        assert_eq!(s.content(), before.committed());
        assert_eq!(s.history().undo_levels(), before.history.undo_levels());
        assert_eq!(s.state().ids, before.ids);
    }

    #[test]
    fn test_prop_edits_coalesce_inside_window() {
        let (mut s, clock) = session_with(EditorConfig::default());
        let section = s.insert_block(kind::SECTION, &root(), None).unwrap();
        let heading = s.insert_block(kind::HEADING, &section, None).unwrap();

        s.update_props(&heading, patch(json!({ "text": "H" }))).unwrap();
        clock.advance(Duration::from_millis(100));
        let outcome = s.update_props(&heading, patch(json!({ "text": "He" }))).unwrap();
        assert!(matches!(outcome, Outcome::Committed { coalesced: true, .. }));

        clock.advance(Duration::from_millis(1000));
        let outcome = s.update_props(&heading, patch(json!({ "text": "Hey" }))).unwrap();
        assert!(matches!(outcome, Outcome::Committed { coalesced: false, .. }));

        s.undo().unwrap();
        let BlockProps::Heading(props) = &s.content().get(&heading).unwrap().props else {
            panic!("expected heading");
        };
        assert_eq!(props.text, "He");

        s.undo().unwrap();
        let BlockProps::Heading(props) = &s.content().get(&heading).unwrap().props else {
            panic!("expected heading");
        };
        assert_eq!(props.text, "");
    }

    #[test]
    fn test_locked_blocks_resist_structural_edits() {
        let (mut s, _) = session();
        let section = s.insert_block(kind::SECTION, &root(), None).unwrap();
        let text = s.insert_block(kind::TEXT, &section, None).unwrap();
        s.update_meta(&text, MetaPatch::locked(true)).unwrap();

        assert!(matches!(s.remove(&section), Err(SessionError::Locked(id)) if id == text));
        assert!(matches!(s.cut(&text), Err(SessionError::Locked(_))));
        assert!(matches!(
            s.update_props(&text, patch(json!({ "html": "x" }))),
            Err(SessionError::Locked(_))
        ));

        s.update_meta(&text, MetaPatch::locked(false)).unwrap();
        assert!(s.remove(&section).is_ok());
    }

    #[test]
    fn test_selection_cleared_when_ancestor_removed() {
        let (mut s, _) = session();
        let section = s.insert_block(kind::SECTION, &root(), None).unwrap();
        let text = s.insert_block(kind::TEXT, &section, None).unwrap();
        s.select(Some(text.clone())).unwrap();

        s.remove(&section).unwrap();
        assert_eq!(s.selection(), None);

        assert!(s.select(Some(text)).is_err());
    }

    #[test]
    fn test_duplicate_places_copy_after_original() {
        let (mut s, _) = session();
        let section = s.insert_block(kind::SECTION, &root(), None).unwrap();
        let text = s.insert_block(kind::TEXT, &section, None).unwrap();
        s.insert_block(kind::SPACER, &section, None).unwrap();

        let outcome = s.duplicate(&text).unwrap();
        let copy = outcome.created().cloned().unwrap();
        assert_eq!(s.content().index_in_parent(&copy), Some(1));
        assert_ne!(copy, text);
        assert!(matches!(s.duplicate(&root()), Err(SessionError::Mutation(MutationError::RootImmutable))));
    }

    #[test]
    fn test_paste_rejected_is_silent_noop() {
        let (mut s, _) = session();
        let section = s.insert_block(kind::SECTION, &root(), None).unwrap();
        let text = s.insert_block(kind::TEXT, &section, None).unwrap();
        s.copy(&text).unwrap();
        let revision = s.revision();

        assert_eq!(s.paste(&root()).unwrap(), Outcome::PasteRejected);
        assert_eq!(s.revision(), revision);
    }

    #[test]
    fn test_draft_preview_then_commit() {
        let (mut s, _) = session();
        let section = s.insert_block(kind::SECTION, &root(), None).unwrap();
        let spacer = s.insert_block(kind::SPACER, &section, None).unwrap();
        let committed = s.content().clone();

        for height in [40, 48, 56] {
            s.preview(Mutation::UpdateProps {
                node_id: spacer.clone(),
                patch: patch(json!({ "height": height })),
            })
            .unwrap();
        }
        assert_eq!(s.content(), &committed);
        assert_ne!(s.working(), &committed);

        let outcome = s.commit(CommitReason::Resize).unwrap();
        assert!(matches!(outcome, Outcome::Committed { reason: CommitReason::Resize, .. }));
        let BlockProps::Spacer(props) = &s.content().get(&spacer).unwrap().props else {
            panic!("expected spacer");
        };
        assert_eq!(props.height, 56);

        s.undo().unwrap();
        assert_eq!(s.content(), &committed);
    }

    #[test]
    fn test_discard_draft() {
        let (mut s, _) = session();
        let section = s.insert_block(kind::SECTION, &root(), None).unwrap();
        s.preview(Mutation::UpdateMeta {
            node_id: section,
            patch: MetaPatch::hidden(true),
        })
        .unwrap();

        assert_eq!(s.discard_draft().unwrap(), Outcome::DraftDiscarded);
        assert_eq!(s.discard_draft().unwrap(), Outcome::Unchanged);
        assert_eq!(s.commit(CommitReason::EditMeta).unwrap(), Outcome::Unchanged);
    }

    #[test]
    fn test_palette_drop_inserts_with_drag_reason() {
        let (mut s, _) = session();
        let section = s.insert_block(kind::SECTION, &root(), None).unwrap();
        let outcome = s
            .dispatch(Intent::Drop {
                source: DragSource::Palette(kind::IMAGE.into()),
                target: DropTarget {
                    parent_id: section.clone(),
                    index: 0,
                },
            })
            .unwrap();

        assert!(matches!(outcome, Outcome::Committed { reason: CommitReason::Drag, .. }));
        assert_eq!(s.history().last_reason(), Some(CommitReason::Drag));
        assert_eq!(s.content().children(&section).len(), 1);
    }

    #[test]
    fn test_preview_checks_locks_on_working_tree() {
        let (mut s, _) = session();
        let section = s.insert_block(kind::SECTION, &root(), None).unwrap();
        let text = s.insert_block(kind::TEXT, &section, None).unwrap();
        let html = || Mutation::UpdateProps {
            node_id: text.clone(),
            patch: patch(json!({ "html": "<p>x</p>" })),
        };

        // Locked only in the draft
        s.preview(Mutation::UpdateMeta {
            node_id: text.clone(),
            patch: MetaPatch::locked(true),
        })
        .unwrap();
        assert!(matches!(s.preview(html()), Err(SessionError::Locked(id)) if id == text));
        s.discard_draft().unwrap();

        // Locked in the committed tree, unlocked in the draft
        s.update_meta(&text, MetaPatch::locked(true)).unwrap();
        s.preview(Mutation::UpdateMeta {
            node_id: text.clone(),
            patch: MetaPatch::locked(false),
        })
        .unwrap();
        assert_eq!(s.preview(html()).unwrap(), Outcome::Previewed);
    }

    #[test]
    fn test_direct_edit_reports_discarded_draft() {
        let (mut s, _) = session();
        let section = s.insert_block(kind::SECTION, &root(), None).unwrap();
        let spacer = s.insert_block(kind::SPACER, &section, None).unwrap();
        let resize = Mutation::UpdateProps {
            node_id: spacer.clone(),
            patch: patch(json!({ "height": 80 })),
        };

        s.preview(resize.clone()).unwrap();
        let outcome = s.update_meta(&section, MetaPatch::hidden(true)).unwrap();
        assert!(matches!(
            outcome,
            Outcome::Committed {
                reason: CommitReason::EditMeta,
                discarded_draft: true,
                ..
            }
        ));
        assert!(s.history().draft().is_none());
        assert_eq!(s.working(), s.content());

        // An edit that changes nothing still reports the dropped draft
        s.preview(resize).unwrap();
        let outcome = s.update_meta(&section, MetaPatch::hidden(true)).unwrap();
        assert_eq!(outcome, Outcome::DraftDiscarded);

        let outcome = s.update_meta(&section, MetaPatch::hidden(false)).unwrap();
        assert!(matches!(outcome, Outcome::Committed { discarded_draft: false, .. }));
    }

    #[test]
    fn test_component_lookup() {
        let (mut s, _) = session();
        let section = s.insert_block(kind::SECTION, &root(), None).unwrap();
        let text = s.insert_block(kind::TEXT, &section, None).unwrap();
        assert_eq!(s.component_for(&text), Some("RichText"));
        assert_eq!(s.component_for(&root()), Some("PageRoot"));
    }
}
