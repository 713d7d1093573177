use super::{PublishRule, RuleContext};
use pagecraft_model::{BlockNode, ValidationError};

/// Blocks gated by a platform module need that module enabled
pub struct ModuleGateRule;

impl PublishRule for ModuleGateRule {
    fn name(&self) -> &'static str {
        "module-gate"
    }

    fn description(&self) -> &'static str {
        "Block kinds gated by a module can only be published when the module is enabled"
    }

    fn check_node(&self, node: &BlockNode, ctx: &RuleContext<'_>) -> Vec<ValidationError> {
        match ctx.registry.module_for(node.kind()) {
            Some(module) if !ctx.enabled_modules.contains(module) => {
                vec![ValidationError::content_rule(
                    &node.id,
                    format!(
                        "Block '{}' requires the '{}' module, which is not enabled",
                        node.kind(),
                        module
                    ),
                )
                .with_module(module)]
            }
            _ => Vec::new(),
        }
    }
}
