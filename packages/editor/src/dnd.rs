//! # Drop Resolution
//!
//! Turns one frame of pointer geometry into a single insertion point.
//!
//! A zone is eligible when its parent accepts the dragged kind, is not the
//! dragged node or inside it, and is not hidden. Among eligible zones within
//! snap distance of the pointer the winner is the nearest, then the deepest,
//! then the smallest. Zones without a fixed index get one from the pointer's
//! position relative to the parent's children along its layout axis.

use pagecraft_model::{NodeId, PageContent};
use pagecraft_registry::{LayoutAxis, Registry};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn along(&self, axis: LayoutAxis) -> f64 {
        match axis {
            LayoutAxis::Vertical => self.y,
            LayoutAxis::Horizontal => self.x,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Distance from `p` to the nearest edge; zero inside
    pub fn distance_to(&self, p: Point) -> f64 {
        let dx = (self.x - p.x).max(0.0).max(p.x - self.right());
        let dy = (self.y - p.y).max(0.0).max(p.y - self.bottom());
        dx.hypot(dy)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A registered drop region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropZone {
    pub rect: Rect,
    pub parent_id: NodeId,
    /// Fixed insertion index, or `None` to derive it from the pointer
    #[serde(default)]
    pub index: Option<usize>,
}

/// Geometry for one frame of a drag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragFrame {
    pub pointer: Point,
    pub zones: Vec<DropZone>,
    /// Rendered bounds of blocks, used to derive indexes
    #[serde(default)]
    pub node_rects: HashMap<NodeId, Rect>,
}

/// What is being dragged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "camelCase")]
pub enum DragSource {
    /// A block already in the document
    Existing(NodeId),
    /// A new block of this kind from the palette
    Palette(String),
}

/// The resolved insertion point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTarget {
    pub parent_id: NodeId,
    pub index: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DropError {
    #[error("No valid drop target")]
    NoValidTarget,

    #[error("Dragged block {0} is not in the document")]
    UnknownSource(NodeId),
}

pub const DEFAULT_SNAP_DISTANCE: f64 = 12.0;

/// Pure geometry-in, insertion-point-out resolver
#[derive(Debug, Clone, Copy)]
pub struct DropResolver<'a> {
    registry: &'a Registry,
    snap_distance: f64,
}

struct Candidate<'z> {
    zone: &'z DropZone,
    distance: f64,
    depth: usize,
}

impl<'a> DropResolver<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            snap_distance: DEFAULT_SNAP_DISTANCE,
        }
    }

    pub fn with_snap_distance(mut self, snap_distance: f64) -> Self {
        self.snap_distance = snap_distance.max(0.0);
        self
    }

    pub fn resolve(
        &self,
        tree: &PageContent,
        source: &DragSource,
        frame: &DragFrame,
    ) -> Result<DropTarget, DropError> {
        let (dragged_kind, dragged_id) = match source {
            DragSource::Existing(id) => {
                let node = tree
                    .get(id)
                    .ok_or_else(|| DropError::UnknownSource(id.clone()))?;
                (node.kind(), Some(id))
            }
            DragSource::Palette(kind) => (kind.as_str(), None),
        };

        let best = frame
            .zones
            .iter()
            .filter(|zone| self.is_eligible(tree, zone, dragged_kind, dragged_id))
            .map(|zone| Candidate {
                zone,
                distance: zone.rect.distance_to(frame.pointer),
                depth: tree.depth(&zone.parent_id),
            })
            .filter(|c| c.distance <= self.snap_distance)
            .min_by(rank);

        let Some(best) = best else {
            debug!(zones = frame.zones.len(), kind = dragged_kind, "No eligible drop zone");
            return Err(DropError::NoValidTarget);
        };

        let children = tree.children(&best.zone.parent_id);
        let index = match best.zone.index {
            Some(index) => index.min(children.len()),
            None => self.index_from_pointer(tree, &best.zone.parent_id, frame),
        };

        debug!(
            parent_id = %best.zone.parent_id,
            index,
            distance = best.distance,
            "Resolved drop target"
        );
        Ok(DropTarget {
            parent_id: best.zone.parent_id.clone(),
            index,
        })
    }

    fn is_eligible(
        &self,
        tree: &PageContent,
        zone: &DropZone,
        dragged_kind: &str,
        dragged_id: Option<&NodeId>,
    ) -> bool {
        let Some(parent) = tree.get(&zone.parent_id) else {
            return false;
        };
        if parent.meta.hidden || !self.registry.can_contain(parent.kind(), dragged_kind) {
            return false;
        }
        match dragged_id {
            Some(id) => !tree.is_within(&zone.parent_id, id),
            None => true,
        }
    }

    /// Children are counted in the pre-move list so the result feeds straight
    /// into a move
    fn index_from_pointer(&self, tree: &PageContent, parent_id: &NodeId, frame: &DragFrame) -> usize {
        let axis = tree
            .get(parent_id)
            .map(|p| self.registry.layout_axis(p.kind()))
            .unwrap_or_default();
        let pointer = frame.pointer.along(axis);

        let children = tree.children(parent_id);
        children
            .iter()
            .position(|child| {
                frame
                    .node_rects
                    .get(child)
                    .is_some_and(|rect| pointer < rect.center().along(axis))
            })
            .unwrap_or(children.len())
    }
}

fn rank(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| b.depth.cmp(&a.depth))
        .then_with(|| a.zone.rect.area().total_cmp(&b.zone.rect.area()))
}
