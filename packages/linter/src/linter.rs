use crate::rules::{RuleContext, RuleRegistry};
use pagecraft_model::{PageContent, ValidationError};
use pagecraft_registry::Registry;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Options for configuring publish validation
#[derive(Debug, Default)]
pub struct PublishOptions {
    /// Platform modules enabled for the tenant
    pub enabled_modules: HashSet<String>,

    /// Custom rule registry (uses default if None)
    pub rules: Option<RuleRegistry>,
}

impl PublishOptions {
    pub fn with_modules<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled_modules: modules.into_iter().map(Into::into).collect(),
            rules: None,
        }
    }
}

/// Outcome of publish validation
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishReport {
    pub errors: Vec<ValidationError>,
}

impl PublishReport {
    pub fn is_publishable(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run every publish rule over every node reachable from the root, in
/// document order
pub fn publish_validate(
    content: &PageContent,
    registry: &Registry,
    options: &PublishOptions,
) -> PublishReport {
    let default_rules;
    let rules = match &options.rules {
        Some(rules) => rules,
        None => {
            default_rules = RuleRegistry::new();
            &default_rules
        }
    };

    let ctx = RuleContext {
        content,
        registry,
        enabled_modules: &options.enabled_modules,
    };

    let mut errors = Vec::new();
    for id in content.descendants(content.root_id()) {
        let Some(node) = content.get(&id) else {
            continue;
        };
        for rule in rules.rules() {
            let found = rule.check_node(node, &ctx);
            if !found.is_empty() {
                debug!(rule = rule.name(), node_id = %id, count = found.len(), "Publish rule failed");
            }
            errors.extend(found);
        }
    }

    PublishReport { errors }
}
