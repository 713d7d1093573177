//! # Migrations
//!
//! Version-tagged rewrites that bring an older document shape up to
//! [`CURRENT_VERSION`]. They run on the untyped [`RawDocument`] before props
//! are typed, strictly in ascending order, and each one stamps the document
//! with its version when done.
//!
//! | version | change |
//! |---|---|
//! | 2 | image `alt` renamed to `altText` |
//! | 3 | image `dimensions: "WxH"` split into `width` and `height` |

use pagecraft_model::{kind, FormatError, RawDocument};
use serde_json::{Map, Value};
use tracing::debug;

/// Shape version written by this build
pub const CURRENT_VERSION: u32 = 3;

/// One step in the upgrade chain
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Version the document is at after this step
    pub version: u32,
    pub description: &'static str,
    apply: fn(&mut RawDocument),
}

impl Migration {
    pub fn new(version: u32, description: &'static str, apply: fn(&mut RawDocument)) -> Self {
        Self {
            version,
            description,
            apply,
        }
    }
}

/// An ordered migration chain
#[derive(Debug, Clone)]
pub struct Migrator {
    migrations: Vec<Migration>,
    current: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("Migration to version {found} follows version {previous}; versions must ascend by one")]
    Gap { previous: u32, found: u32 },
}

impl Migrator {
    /// Build a chain. Versions must start at 2 and ascend by exactly one so
    /// no version can be skipped.
    pub fn new(migrations: Vec<Migration>) -> Result<Self, ChainError> {
        let mut previous = 1;
        for migration in &migrations {
            if migration.version != previous + 1 {
                return Err(ChainError::Gap {
                    previous,
                    found: migration.version,
                });
            }
            previous = migration.version;
        }

        Ok(Self {
            migrations,
            current: previous,
        })
    }

    /// The chain shipped with this build
    pub fn builtin() -> Self {
        Self {
            migrations: vec![
                Migration::new(2, "rename image alt to altText", rename_image_alt),
                Migration::new(3, "split image dimensions", split_image_dimensions),
            ],
            current: CURRENT_VERSION,
        }
    }

    pub fn current_version(&self) -> u32 {
        self.current
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Upgrade `document` in place. Returns the versions that were applied;
    /// empty when the document is already current.
    pub fn migrate(&self, document: &mut RawDocument) -> Result<Vec<u32>, FormatError> {
        if document.version > self.current {
            return Err(FormatError::UnsupportedVersion {
                found: document.version,
                current: self.current,
            });
        }

        let mut applied = Vec::new();
        for migration in &self.migrations {
            if migration.version <= document.version {
                continue;
            }
            debug!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );
            (migration.apply)(document);
            document.version = migration.version;
            applied.push(migration.version);
        }

        Ok(applied)
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::builtin()
    }
}

fn image_props(document: &mut RawDocument) -> impl Iterator<Item = &mut Map<String, Value>> {
    document
        .nodes
        .values_mut()
        .filter(|node| node.kind == kind::IMAGE)
        .filter_map(|node| node.props.as_object_mut())
}

fn rename_image_alt(document: &mut RawDocument) {
    for props in image_props(document) {
        if let Some(alt) = props.remove("alt") {
            props.entry("altText").or_insert(alt);
        }
    }
}

fn split_image_dimensions(document: &mut RawDocument) {
    for props in image_props(document) {
        let parsed = props
            .get("dimensions")
            .and_then(Value::as_str)
            .and_then(parse_dimensions);
        let Some((width, height)) = parsed else {
            continue;
        };
        props.remove("dimensions");
        props.entry("width").or_insert(Value::from(width));
        props.entry("height").or_insert(Value::from(height));
    }
}

fn parse_dimensions(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.split_once(['x', 'X'])?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}
