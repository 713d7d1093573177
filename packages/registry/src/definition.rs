use serde::{Deserialize, Serialize};

/// Direction a container lays out its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutAxis {
    /// Children stack top to bottom
    #[default]
    Vertical,
    /// Children sit left to right
    Horizontal,
}

/// A set of block kinds: either unrestricted or an explicit allow-list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "kinds")]
pub enum KindSet {
    #[default]
    Any,
    Only(Vec<String>),
}

impl KindSet {
    pub fn only<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KindSet::Only(kinds.into_iter().map(Into::into).collect())
    }

    /// A set nothing belongs to
    pub fn none() -> Self {
        KindSet::Only(Vec::new())
    }

    pub fn allows(&self, kind: &str) -> bool {
        match self {
            KindSet::Any => true,
            KindSet::Only(kinds) => kinds.iter().any(|k| k == kind),
        }
    }
}

/// Catalog entry for one block kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDefinition {
    /// Key stored in `BlockNode` type fields
    pub kind: String,

    /// Display title for palettes and outlines
    pub title: String,

    /// Whether the kind may hold children at all
    pub container: bool,

    pub layout: LayoutAxis,

    /// Kinds this container accepts
    pub allowed_children: KindSet,

    /// Kinds allowed to host this block
    pub allowed_parents: KindSet,

    /// Platform module that must be enabled for this kind to be published
    pub module: Option<String>,

    /// Component name handed to the renderer
    pub component: String,
}

impl BlockDefinition {
    /// A kind that cannot hold children
    pub fn leaf(kind: impl Into<String>, title: impl Into<String>) -> Self {
        let kind = kind.into();
        Self {
            component: component_name(&kind),
            kind,
            title: title.into(),
            container: false,
            layout: LayoutAxis::Vertical,
            allowed_children: KindSet::none(),
            allowed_parents: KindSet::Any,
            module: None,
        }
    }

    /// A kind that can hold children, any kind by default
    pub fn container(kind: impl Into<String>, title: impl Into<String>, layout: LayoutAxis) -> Self {
        Self {
            container: true,
            layout,
            allowed_children: KindSet::Any,
            ..Self::leaf(kind, title)
        }
    }

    pub fn children(mut self, kinds: KindSet) -> Self {
        self.allowed_children = kinds;
        self
    }

    pub fn parents(mut self, kinds: KindSet) -> Self {
        self.allowed_parents = kinds;
        self
    }

    pub fn module(mut self, key: impl Into<String>) -> Self {
        self.module = Some(key.into());
        self
    }

    pub fn component(mut self, name: impl Into<String>) -> Self {
        self.component = name.into();
        self
    }
}

/// `payment-button` → `PaymentButton`
fn component_name(kind: &str) -> String {
    kind.split(|c: char| c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
