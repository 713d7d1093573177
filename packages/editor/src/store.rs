//! # Document Stores
//!
//! The persistence contract: `load(id)` and `save(id, document)` over the
//! wire format. [`MemoryStore`] backs tests and previews, [`FileStore`] keeps
//! one `<id>.json` per document in a directory.

use async_trait::async_trait;
use pagecraft_model::{FormatError, RawDocument};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document {0} not found")]
    NotFound(String),

    #[error("Invalid document id '{0}'")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] FormatError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, document_id: &str) -> StoreResult<RawDocument>;

    async fn save(&self, document_id: &str, document: &RawDocument) -> StoreResult<()>;
}

/// In-memory store with switches for simulating a flaky backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, RawDocument>>,
    offline: AtomicBool,
    saves: AtomicUsize,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every save waits this long before landing
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn insert(&self, document_id: impl Into<String>, document: RawDocument) {
        self.documents().insert(document_id.into(), document);
    }

    pub fn get(&self, document_id: &str) -> Option<RawDocument> {
        self.documents().get(document_id).cloned()
    }

    fn documents(&self) -> std::sync::MutexGuard<'_, HashMap<String, RawDocument>> {
        // The map is always left consistent, so a poisoned lock is still usable
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, document_id: &str) -> StoreResult<RawDocument> {
        self.check_online()?;
        self.get(document_id)
            .ok_or_else(|| StoreError::NotFound(document_id.to_string()))
    }

    async fn save(&self, document_id: &str, document: &RawDocument) -> StoreResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.check_online()?;
        self.insert(document_id, document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// One JSON file per document under a root directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, document_id: &str) -> StoreResult<PathBuf> {
        let valid = !document_id.is_empty()
            && !document_id.starts_with('.')
            && document_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StoreError::InvalidId(document_id.to_string()));
        }
        Ok(self.root.join(format!("{}.json", document_id)))
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn load(&self, document_id: &str) -> StoreResult<RawDocument> {
        let path = self.path_for(document_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(document_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(RawDocument::from_json(&content)?)
    }

    async fn save(&self, document_id: &str, document: &RawDocument) -> StoreResult<()> {
        let path = self.path_for(document_id)?;
        let json = document.to_json()?;

        tokio::fs::create_dir_all(&self.root).await?;
        // Write aside then rename so readers never see a torn file
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, json).await?;
        tokio::fs::rename(&staging, &path).await?;

        debug!(document_id, path = %path.display(), "Saved document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_model::PageContent;

    fn document() -> RawDocument {
        RawDocument::from_content(&PageContent::with_default_root("r"), 3)
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(matches!(store.load("home").await, Err(StoreError::NotFound(_))));

        store.save("home", &document()).await.unwrap();
        assert_eq!(store.load("home").await.unwrap(), document());
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_offline() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(matches!(
            store.save("home", &document()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("docs"));

        store.save("landing-page", &document()).await.unwrap();
        assert!(dir.path().join("docs/landing-page.json").exists());
        assert_eq!(store.load("landing-page").await.unwrap(), document());
        assert!(matches!(store.load("missing").await, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_file_store_rejects_path_ids() {
        let store = FileStore::new("/tmp/docs");
        assert!(store.path_for("../etc/passwd").is_err());
        assert!(store.path_for("a/b").is_err());
        assert!(store.path_for("").is_err());
        assert!(store.path_for("page_1").is_ok());
    }
}
