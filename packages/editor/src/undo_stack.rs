//! # Undo/Redo History
//!
//! Snapshot-based history over committed page trees.
//!
//! ## Design
//!
//! - `committed` is the current baseline; `past` and `future` hold whole
//!   snapshots (cheap, since untouched nodes are shared)
//! - Committing pushes the old baseline onto `past` and clears `future`
//! - A commit with the same reason as the previous one, inside the
//!   coalescing window, replaces the baseline in place instead
//! - `past` is bounded; the oldest snapshots fall off the end
//! - An optional draft holds uncommitted work (live previews)

use pagecraft_model::PageContent;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of undo levels
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Why a snapshot was committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitReason {
    Insert,
    Move,
    Drag,
    Delete,
    Cut,
    Paste,
    Duplicate,
    EditProps,
    EditMeta,
    Resize,
    Shortcut,
    Repair,
}

/// What a commit did to the history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Old baseline moved to `past`
    Pushed,
    /// Baseline replaced in place
    Coalesced,
    /// New tree equals the baseline; nothing recorded
    Unchanged,
}

#[derive(Debug, Clone, Copy)]
struct LastCommit {
    reason: CommitReason,
    at: Duration,
}

/// Undo/redo history for one editing session
#[derive(Debug, Clone)]
pub struct History {
    committed: PageContent,

    /// Older baselines (most recent last)
    past: VecDeque<PageContent>,

    /// Undone baselines (most recent last)
    future: Vec<PageContent>,

    /// Uncommitted working tree
    draft: Option<PageContent>,

    last_commit: Option<LastCommit>,

    /// Maximum number of undo levels (0 = no undo)
    max_depth: usize,

    coalesce_window: Duration,
}

impl History {
    /// Create a history with default depth and no coalescing
    pub fn new(committed: PageContent) -> Self {
        Self::with_limits(committed, DEFAULT_MAX_DEPTH, Duration::ZERO)
    }

    pub fn with_limits(committed: PageContent, max_depth: usize, coalesce_window: Duration) -> Self {
        Self {
            committed,
            past: VecDeque::new(),
            future: Vec::new(),
            draft: None,
            last_commit: None,
            max_depth,
            coalesce_window,
        }
    }

    pub fn committed(&self) -> &PageContent {
        &self.committed
    }

    pub fn draft(&self) -> Option<&PageContent> {
        self.draft.as_ref()
    }

    /// The tree edits apply to: the draft if there is one, else the baseline
    pub fn working(&self) -> &PageContent {
        self.draft.as_ref().unwrap_or(&self.committed)
    }

    /// Replace the draft without touching history
    pub fn stage(&mut self, content: PageContent) {
        self.draft = Some(content);
    }

    /// Drop the draft; true if there was one
    pub fn discard_draft(&mut self) -> bool {
        self.draft.take().is_some()
    }

    pub fn take_draft(&mut self) -> Option<PageContent> {
        self.draft.take()
    }

    /// Commit `content` as the new baseline. `now` is a monotonic timestamp.
    pub fn commit(&mut self, content: PageContent, reason: CommitReason, now: Duration) -> CommitOutcome {
        self.draft = None;

        if content == self.committed {
            return CommitOutcome::Unchanged;
        }

        // Same reason inside the window replaces the latest entry. A zero
        // window never coalesces.
        let coalesce = self.last_commit.is_some_and(|last| {
            last.reason == reason && now.saturating_sub(last.at) < self.coalesce_window
        });

        let outcome = if coalesce {
            self.committed = content;
            CommitOutcome::Coalesced
        } else {
            let previous = std::mem::replace(&mut self.committed, content);
            self.push_past(previous);
            CommitOutcome::Pushed
        };

        // New action invalidates future
        self.future.clear();
        self.last_commit = Some(LastCommit { reason, at: now });
        outcome
    }

    /// Commit the draft, if any
    pub fn commit_draft(&mut self, reason: CommitReason, now: Duration) -> Option<CommitOutcome> {
        let draft = self.draft.take()?;
        Some(self.commit(draft, reason, now))
    }

    fn push_past(&mut self, snapshot: PageContent) {
        if self.max_depth == 0 {
            return;
        }
        self.past.push_back(snapshot);
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
    }

    /// Step back one baseline; false when there is nothing to undo
    pub fn undo(&mut self) -> bool {
        self.draft = None;
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.committed, previous);
        self.future.push(current);
        self.last_commit = None;
        true
    }

    /// Step forward one baseline; false when there is nothing to redo
    pub fn redo(&mut self) -> bool {
        self.draft = None;
        let Some(next) = self.future.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.committed, next);
        self.push_past(current);
        self.last_commit = None;
        true
    }

    /// Reason of the most recent commit, until an undo or redo
    pub fn last_reason(&self) -> Option<CommitReason> {
        self.last_commit.map(|last| last.reason)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.past.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.future.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Forget all undo/redo history, keeping the baseline
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.draft = None;
        self.last_commit = None;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(PageContent::with_default_root("root"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_model::{BlockMeta, BlockNode, NodeId};

    fn version(n: usize) -> PageContent {
        let root = BlockNode::of_kind("root", "page").with_meta(BlockMeta {
            label: Some(format!("v{}", n)),
            ..BlockMeta::default()
        });
        PageContent::new(root)
    }

    fn label(content: &PageContent) -> String {
        content
            .get(&NodeId::new("root"))
            .and_then(|n| n.meta.label.clone())
            .unwrap_or_default()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_history_creation() {
        let history = History::new(version(0));
        assert_eq!(history.undo_levels(), 0);
        assert_eq!(history.redo_levels(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_commit_undo_redo() {
        let mut history = History::new(version(0));

        assert_eq!(history.commit(version(1), CommitReason::Move, ms(0)), CommitOutcome::Pushed);
        assert!(history.undo());
        assert_eq!(label(history.committed()), "v0");
        assert!(history.redo());
        assert_eq!(label(history.committed()), "v1");
        assert!(!history.redo());
    }

    #[test]
    fn test_new_commit_clears_redo() {
        let mut history = History::new(version(0));
        history.commit(version(1), CommitReason::Move, ms(0));
        history.undo();
        assert_eq!(history.redo_levels(), 1);

        history.commit(version(2), CommitReason::Move, ms(10));
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_same_reason_inside_window_coalesces() {
        let mut history = History::with_limits(version(0), 100, ms(500));

        assert_eq!(history.commit(version(1), CommitReason::Resize, ms(0)), CommitOutcome::Pushed);
        assert_eq!(history.commit(version(2), CommitReason::Resize, ms(200)), CommitOutcome::Coalesced);
        assert_eq!(history.commit(version(3), CommitReason::Resize, ms(400)), CommitOutcome::Coalesced);
        assert_eq!(history.undo_levels(), 1);

        history.undo();
        assert_eq!(label(history.committed()), "v0");
    }

    #[test]
    fn test_window_elapsed_or_reason_change_pushes() {
        let mut history = History::with_limits(version(0), 100, ms(500));

        history.commit(version(1), CommitReason::EditProps, ms(0));
        assert_eq!(history.commit(version(2), CommitReason::EditProps, ms(900)), CommitOutcome::Pushed);
        assert_eq!(history.commit(version(3), CommitReason::Resize, ms(950)), CommitOutcome::Pushed);
        assert_eq!(history.undo_levels(), 3);
    }

    #[test]
    fn test_any_repeated_reason_coalesces_inside_window() {
        let mut history = History::with_limits(version(0), 100, ms(500));

        assert_eq!(history.commit(version(1), CommitReason::Drag, ms(0)), CommitOutcome::Pushed);
        assert_eq!(history.commit(version(2), CommitReason::Drag, ms(100)), CommitOutcome::Coalesced);
        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.last_reason(), Some(CommitReason::Drag));

        history.undo();
        assert_eq!(label(history.committed()), "v0");
        assert_eq!(history.last_reason(), None);
    }

    #[test]
    fn test_zero_window_never_coalesces() {
        let mut history = History::new(version(0));
        history.commit(version(1), CommitReason::Paste, ms(0));
        assert_eq!(history.commit(version(2), CommitReason::Paste, ms(0)), CommitOutcome::Pushed);
        assert_eq!(history.undo_levels(), 2);
    }

    #[test]
    fn test_undo_breaks_coalescing() {
        let mut history = History::with_limits(version(0), 100, ms(500));
        history.commit(version(1), CommitReason::Resize, ms(0));
        history.commit(version(2), CommitReason::Resize, ms(10));
        history.undo();

        assert_eq!(history.commit(version(3), CommitReason::Resize, ms(20)), CommitOutcome::Pushed);
    }

    #[test]
    fn test_unchanged_commit_records_nothing() {
        let mut history = History::new(version(0));
        assert_eq!(history.commit(version(0), CommitReason::Move, ms(0)), CommitOutcome::Unchanged);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_max_depth_enforced() {
        let mut history = History::with_limits(version(0), 2, Duration::ZERO);
        for i in 1..=3 {
            history.commit(version(i), CommitReason::Move, ms(i as u64));
        }

        assert_eq!(history.undo_levels(), 2);
        assert_eq!(label(history.committed()), "v3");
        history.undo();
        history.undo();
        assert!(!history.undo());
        assert_eq!(label(history.committed()), "v1");
    }

    #[test]
    fn test_draft_is_dropped_by_undo() {
        let mut history = History::new(version(0));
        history.commit(version(1), CommitReason::Move, ms(0));
        history.stage(version(9));
        assert_eq!(label(history.working()), "v9");

        history.undo();
        assert!(history.draft().is_none());
        assert_eq!(label(history.working()), "v0");
    }

    #[test]
    fn test_commit_draft() {
        let mut history = History::new(version(0));
        assert_eq!(history.commit_draft(CommitReason::Resize, ms(0)), None);

        history.stage(version(1));
        assert_eq!(history.commit_draft(CommitReason::Resize, ms(0)), Some(CommitOutcome::Pushed));
        assert_eq!(label(history.committed()), "v1");
        assert!(history.draft().is_none());
    }
}
