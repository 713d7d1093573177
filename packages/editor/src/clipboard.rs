//! Single-slot clipboard

use pagecraft_model::{IdGenerator, Subtree};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardOp {
    Copy,
    Cut,
}

/// A detached subtree plus the operation that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardData {
    pub subtree: Subtree,
    pub op: ClipboardOp,
}

impl ClipboardData {
    pub fn copied(subtree: Subtree) -> Self {
        Self {
            subtree,
            op: ClipboardOp::Copy,
        }
    }

    pub fn cut(subtree: Subtree) -> Self {
        Self {
            subtree,
            op: ClipboardOp::Cut,
        }
    }

    /// A fresh copy for pasting; every paste mints new ids
    pub fn instantiate(&self, ids: &mut IdGenerator) -> Subtree {
        self.subtree.rekeyed(ids)
    }

    /// Once pasted, a cut behaves like a copy
    pub fn after_paste(self) -> Self {
        Self {
            op: ClipboardOp::Copy,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_model::{kind, BlockNode};
    use std::collections::HashSet;

    #[test]
    fn test_each_instance_has_fresh_ids() {
        let clip = ClipboardData::cut(Subtree::single(BlockNode::of_kind("x", kind::TEXT)));
        let mut ids = IdGenerator::from_seed("t");

        let a = clip.instantiate(&mut ids);
        let b = clip.instantiate(&mut ids);
        let all: HashSet<_> = a.ids().chain(b.ids()).chain(clip.subtree.ids()).collect();
        assert_eq!(all.len(), 3);

        assert_eq!(clip.after_paste().op, ClipboardOp::Copy);
    }
}
