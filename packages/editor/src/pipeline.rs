//! # Content Pipeline
//!
//! Every document entering the editor passes through the same stages:
//!
//! ```text
//! JSON → parse → migrate → sanitize → structural validate → composition validate
//!        Format   Format              Structural (fatal)    warnings
//! ```
//!
//! Publish validation is a separate stage run only before publishing.

use crate::migrations::Migrator;
use crate::mutations;
use crate::sanitize::{sanitize_content, AllowListSanitizer, HtmlSanitizer, UrlPolicy};
use pagecraft_linter::{PublishOptions, PublishReport};
use pagecraft_model::{
    validate_tree, FormatError, NodeId, PageContent, RawDocument, Subtree, ValidationError,
};
use pagecraft_registry::Registry;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Cannot open document: {0}")]
    Format(#[from] FormatError),

    #[error("Document is structurally invalid ({} problems)", .0.len())]
    Structural(Vec<ValidationError>),
}

/// A document that made it through every load stage
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub content: PageContent,
    /// Version the document was stored at
    pub source_version: u32,
    pub applied_migrations: Vec<u32>,
    /// Rich-text and link fields the sanitizer rewrote
    pub sanitized_fields: usize,
    /// Composition violations; the editor may repair or block on these
    pub warnings: Vec<ValidationError>,
}

impl LoadedDocument {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// The load pipeline, configured once per editor
#[derive(Clone)]
pub struct Pipeline {
    registry: Arc<Registry>,
    migrator: Migrator,
    sanitizer: Arc<dyn HtmlSanitizer>,
    urls: UrlPolicy,
}

impl Pipeline {
    pub fn new(registry: Arc<Registry>) -> Self {
        let urls = UrlPolicy::default();
        Self {
            registry,
            migrator: Migrator::builtin(),
            sanitizer: Arc::new(AllowListSanitizer::new(urls.clone())),
            urls,
        }
    }

    pub fn with_migrator(mut self, migrator: Migrator) -> Self {
        self.migrator = migrator;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn HtmlSanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Replace the link policy. The default sanitizer is rebuilt to match.
    pub fn with_url_policy(mut self, urls: UrlPolicy) -> Self {
        self.sanitizer = Arc::new(AllowListSanitizer::new(urls.clone()));
        self.urls = urls;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn current_version(&self) -> u32 {
        self.migrator.current_version()
    }

    /// Stage 1: decode the wire format
    pub fn parse(&self, input: &str) -> Result<RawDocument, FormatError> {
        RawDocument::from_json(input)
    }

    /// Stage 2: upgrade to the current shape
    pub fn migrate(&self, raw: &mut RawDocument) -> Result<Vec<u32>, FormatError> {
        self.migrator.migrate(raw)
    }

    /// Stage 3: clean rich text and links. Returns the rewritten field count.
    pub fn sanitize(&self, content: &PageContent) -> (PageContent, usize) {
        sanitize_content(content, self.sanitizer.as_ref(), &self.urls)
    }

    /// Stage 4: any structural problem rejects the document
    pub fn validate_structure(&self, content: &PageContent) -> Result<(), PipelineError> {
        let errors = validate_tree(content);
        if errors.is_empty() {
            return Ok(());
        }
        error!(
            root_id = %content.root_id(),
            nodes = content.len(),
            errors = ?errors,
            "Rejected structurally invalid document"
        );
        Err(PipelineError::Structural(errors))
    }

    /// Stage 5: composition violations, collected
    pub fn validate_composition(&self, content: &PageContent) -> Vec<ValidationError> {
        validate_composition(content, &self.registry)
    }

    /// Run stages 1 through 5 over a persisted document
    pub fn load_str(&self, input: &str) -> Result<LoadedDocument, PipelineError> {
        let raw = self.parse(input)?;
        self.load_raw(raw)
    }

    /// Run stages 2 through 5 over an already decoded document
    pub fn load_raw(&self, mut raw: RawDocument) -> Result<LoadedDocument, PipelineError> {
        let source_version = raw.version;
        let applied_migrations = self.migrate(&mut raw)?;
        let content = raw.into_content()?;

        let (content, sanitized_fields) = self.sanitize(&content);
        self.validate_structure(&content)?;

        let warnings = self.validate_composition(&content);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "Document has composition violations");
        }

        info!(
            root_id = %content.root_id(),
            nodes = content.len(),
            source_version,
            migrations = applied_migrations.len(),
            sanitized_fields,
            "Loaded document"
        );

        Ok(LoadedDocument {
            content,
            source_version,
            applied_migrations,
            sanitized_fields,
            warnings,
        })
    }

    /// Bring a fragment from an external source (a copied subtree in wire
    /// format) through the same stages. The fragment's root may name a
    /// parent from its source document; it is detached.
    pub fn import_fragment(&self, input: &str) -> Result<Subtree, PipelineError> {
        let mut raw = self.parse(input)?;
        let root_id = raw.root_id.clone();
        if let Some(root) = raw.nodes.get_mut(&root_id) {
            root.parent_id = None;
        }

        let loaded = self.load_raw(raw)?;
        for warning in &loaded.warnings {
            debug!(node_id = ?warning.node_id, message = %warning.message, "Fragment composition warning");
        }

        loaded
            .content
            .extract_subtree(&root_id)
            .ok_or(PipelineError::Format(FormatError::MissingRoot(root_id)))
    }

    /// The separate pre-publish stage
    pub fn publish_validate(&self, content: &PageContent, options: &PublishOptions) -> PublishReport {
        pagecraft_linter::publish_validate(content, &self.registry, options)
    }

    /// Encode `content` at the current version
    pub fn serialize(&self, content: &PageContent) -> Result<String, FormatError> {
        RawDocument::from_content(content, self.current_version()).to_json()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("current_version", &self.current_version())
            .field("urls", &self.urls)
            .finish_non_exhaustive()
    }
}

/// Every parent/child pair reachable from the root that the registry
/// rejects, in document order
pub fn validate_composition(content: &PageContent, registry: &Registry) -> Vec<ValidationError> {
    let mut found = Vec::new();
    for id in content.descendants(content.root_id()) {
        let Some(parent) = content.get(&id) else {
            continue;
        };
        for child_id in &parent.child_ids {
            let Some(child) = content.get(child_id) else {
                continue;
            };
            if !registry.can_contain(parent.kind(), child.kind()) {
                found.push(ValidationError::composition(
                    child_id,
                    format!("'{}' may not contain '{}'", parent.kind(), child.kind()),
                ));
            }
        }
    }
    found
}

/// Detach every illegal child subtree. Returns the repaired tree and the ids
/// of the subtrees that were removed.
pub fn repair_composition(
    content: &PageContent,
    registry: &Registry,
) -> Result<(PageContent, Vec<NodeId>), mutations::MutationError> {
    let mut repaired = content.clone();
    let mut removed = Vec::new();

    for violation in validate_composition(content, registry) {
        let Some(id) = violation.node_id else {
            continue;
        };
        // An earlier removal may already have taken this one with its ancestor
        if !repaired.contains(&id) {
            continue;
        }
        repaired = mutations::remove(&repaired, &id)?;
        removed.push(id);
    }

    if !removed.is_empty() {
        info!(removed = removed.len(), "Repaired composition violations");
    }
    Ok((repaired, removed))
}
