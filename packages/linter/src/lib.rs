//! Publish-time content rules.
//!
//! Runs only before a document is marked published. Findings are
//! `content-rule` validation errors: they block publishing but never editing.

mod linter;
mod rules;

pub use linter::{publish_validate, PublishOptions, PublishReport};
pub use rules::{
    ButtonLabelRule, ImageAltTextRule, ModuleGateRule, PublishRule, RuleContext, RuleRegistry,
    UnknownKindRule,
};
