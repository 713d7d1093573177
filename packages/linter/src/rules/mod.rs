mod a11y;
mod module_gate;
mod unknown_kind;

pub use a11y::{ButtonLabelRule, ImageAltTextRule};
pub use module_gate::ModuleGateRule;
pub use unknown_kind::UnknownKindRule;

use pagecraft_model::{BlockNode, PageContent, ValidationError};
use pagecraft_registry::Registry;
use std::collections::HashSet;

/// What a rule can see besides the node under inspection
pub struct RuleContext<'a> {
    pub content: &'a PageContent,
    pub registry: &'a Registry,
    pub enabled_modules: &'a HashSet<String>,
}

/// Trait for implementing publish rules
pub trait PublishRule: Send + Sync {
    /// Unique identifier for this rule
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Check one node
    fn check_node(&self, node: &BlockNode, ctx: &RuleContext<'_>) -> Vec<ValidationError>;
}

/// Registry of all available publish rules
pub struct RuleRegistry {
    rules: Vec<Box<dyn PublishRule>>,
}

impl RuleRegistry {
    /// Create a new registry with all built-in rules
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(ImageAltTextRule),
                Box::new(ButtonLabelRule),
                Box::new(ModuleGateRule),
                Box::new(UnknownKindRule),
            ],
        }
    }

    /// Get all registered rules
    pub fn rules(&self) -> &[Box<dyn PublishRule>] {
        &self.rules
    }

    /// Create an empty registry
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a custom rule to the registry
    pub fn add_rule(&mut self, rule: Box<dyn PublishRule>) {
        self.rules.push(rule);
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &format!("{} rules", self.rules.len()))
            .finish()
    }
}
