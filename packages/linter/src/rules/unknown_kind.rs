use super::{PublishRule, RuleContext};
use pagecraft_model::{BlockNode, ValidationError};

/// Kinds missing from the registry have no component to render with
pub struct UnknownKindRule;

impl PublishRule for UnknownKindRule {
    fn name(&self) -> &'static str {
        "unknown-kind"
    }

    fn description(&self) -> &'static str {
        "Every block must be of a registered kind"
    }

    fn check_node(&self, node: &BlockNode, ctx: &RuleContext<'_>) -> Vec<ValidationError> {
        if ctx.registry.get_definition(node.kind()).is_some() {
            return Vec::new();
        }
        vec![ValidationError::content_rule(
            &node.id,
            format!("Unknown block kind '{}'", node.kind()),
        )]
    }
}
