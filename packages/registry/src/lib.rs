//! # Block Registry
//!
//! Static catalog of block kinds and their composition rules: which kinds a
//! container accepts, which parents a kind may live under, how a container
//! lays out its children, and which platform module gates a kind.
//!
//! Lookups are pure. Unknown kinds fail closed: they are not containers and
//! they reject every child.

mod definition;

pub use definition::{BlockDefinition, KindSet, LayoutAxis};

use pagecraft_model::{kind, BlockProps};
use std::collections::HashMap;

/// Module key gating payment blocks
pub const MODULE_PAYMENTS: &str = "payments";
/// Module key gating embedded media
pub const MODULE_MEDIA: &str = "media";

/// Catalog of block kinds
#[derive(Debug, Clone, Default)]
pub struct Registry {
    definitions: HashMap<String, BlockDefinition>,
}

impl Registry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every built-in kind
    pub fn builtin() -> Self {
        let content = [
            kind::HEADING,
            kind::TEXT,
            kind::IMAGE,
            kind::BUTTON,
            kind::PAYMENT_BUTTON,
            kind::VIDEO,
            kind::SPACER,
            kind::GALLERY,
        ];
        let section_children: Vec<&str> = content.iter().copied().chain([kind::ROW]).collect();

        let mut registry = Self::empty();
        registry.register(
            BlockDefinition::container(kind::PAGE, "Page", LayoutAxis::Vertical)
                .children(KindSet::only([kind::SECTION]))
                .parents(KindSet::none())
                .component("PageRoot"),
        );
        registry.register(
            BlockDefinition::container(kind::SECTION, "Section", LayoutAxis::Vertical)
                .children(KindSet::only(section_children.clone()))
                .parents(KindSet::only([kind::PAGE])),
        );
        registry.register(
            BlockDefinition::container(kind::ROW, "Row", LayoutAxis::Horizontal)
                .children(KindSet::only([kind::COLUMN]))
                .parents(KindSet::only([kind::SECTION, kind::COLUMN])),
        );
        registry.register(
            BlockDefinition::container(kind::COLUMN, "Column", LayoutAxis::Vertical)
                .children(KindSet::only(section_children))
                .parents(KindSet::only([kind::ROW])),
        );
        registry.register(
            BlockDefinition::container(kind::GALLERY, "Gallery", LayoutAxis::Horizontal)
                .children(KindSet::only([kind::IMAGE])),
        );
        registry.register(BlockDefinition::leaf(kind::HEADING, "Heading"));
        registry.register(BlockDefinition::leaf(kind::TEXT, "Text").component("RichText"));
        registry.register(BlockDefinition::leaf(kind::IMAGE, "Image"));
        registry.register(BlockDefinition::leaf(kind::BUTTON, "Button"));
        registry.register(
            BlockDefinition::leaf(kind::PAYMENT_BUTTON, "Payment button")
                .parents(KindSet::only([kind::SECTION, kind::COLUMN]))
                .module(MODULE_PAYMENTS),
        );
        registry.register(BlockDefinition::leaf(kind::VIDEO, "Video").module(MODULE_MEDIA));
        registry.register(BlockDefinition::leaf(kind::SPACER, "Spacer"));
        registry
    }

    /// Add or replace a definition
    pub fn register(&mut self, definition: BlockDefinition) {
        self.definitions.insert(definition.kind.clone(), definition);
    }

    pub fn get_definition(&self, kind: &str) -> Option<&BlockDefinition> {
        self.definitions.get(kind)
    }

    /// Whether a block of `child` kind may live directly inside `parent`
    pub fn can_contain(&self, parent: &str, child: &str) -> bool {
        let (Some(parent_def), Some(child_def)) =
            (self.get_definition(parent), self.get_definition(child))
        else {
            return false;
        };

        parent_def.container
            && parent_def.allowed_children.allows(child)
            && child_def.allowed_parents.allows(parent)
    }

    pub fn is_container(&self, kind: &str) -> bool {
        self.get_definition(kind).is_some_and(|d| d.container)
    }

    /// Layout axis of a container; vertical for anything unknown
    pub fn layout_axis(&self, kind: &str) -> LayoutAxis {
        self.get_definition(kind)
            .map(|d| d.layout)
            .unwrap_or_default()
    }

    /// Module gate for a kind, if any
    pub fn module_for(&self, kind: &str) -> Option<&str> {
        self.get_definition(kind).and_then(|d| d.module.as_deref())
    }

    /// Component the renderer should use for a kind
    pub fn component_for(&self, kind: &str) -> Option<&str> {
        self.get_definition(kind).map(|d| d.component.as_str())
    }

    /// Default props for a freshly inserted block of `kind`
    pub fn default_props(&self, kind: &str) -> Option<BlockProps> {
        self.get_definition(kind)
            .map(|d| BlockProps::default_for(&d.kind))
    }

    /// All registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
