use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one block in a page document.
///
/// Ids are opaque strings on the wire; freshly minted ids come from an
/// [`IdGenerator`] and look like `<seed>-<n>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Generate a stable seed for a document id using CRC32
pub fn document_seed(document_id: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(b"page://");
    hasher.update(document_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential id generator for blocks within an editing session
///
/// The counter never goes backwards, so ids handed out by one generator are
/// unique for its lifetime. Callers that load an existing document should
/// [`reserve`](IdGenerator::reserve) the ids already present so that a
/// generated id never collides with a persisted one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    pub fn new(document_id: &str) -> Self {
        Self {
            seed: document_seed(document_id),
            count: 0,
        }
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Generate next sequential id
    pub fn next_id(&mut self) -> NodeId {
        self.count += 1;
        NodeId(format!("{}-{}", self.seed, self.count))
    }

    /// Bump the counter past any id of the form `<seed>-<n>` in `ids`
    pub fn reserve<'a>(&mut self, ids: impl IntoIterator<Item = &'a NodeId>) {
        let prefix = format!("{}-", self.seed);
        for id in ids {
            if let Some(n) = id
                .as_str()
                .strip_prefix(&prefix)
                .and_then(|rest| rest.parse::<u64>().ok())
            {
                self.count = self.count.max(n);
            }
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::from_seed("blk")
    }
}
