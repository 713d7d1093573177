//! # Autosave
//!
//! A background task that persists committed snapshots after a quiet period.
//!
//! ```text
//! session ──schedule(rev, doc)──▶ watch ──▶ worker ──debounce──▶ store.save
//!         ◀────────────── SaveStatus (watch) ──────────────────┘
//! ```
//!
//! Only the newest snapshot is ever saved; one that lands while a save is in
//! flight is saved next. A failed save is reported through the status and
//! retried after another debounce period or on `flush`. Edits never wait on
//! the store.

use crate::errors::EditorError;
use crate::store::{DocumentStore, StoreResult};
use pagecraft_model::RawDocument;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SaveStatus {
    /// Nothing has been scheduled yet
    Idle,
    /// A snapshot is waiting for the debounce to elapse
    Pending,
    Saving { revision: u64 },
    Saved { revision: u64 },
    /// The last attempt failed; it will be retried
    Failed { revision: u64, message: String },
}

#[derive(Debug)]
struct Snapshot {
    revision: u64,
    document: RawDocument,
}

enum Command {
    Flush(oneshot::Sender<StoreResult<()>>),
    Shutdown,
}

/// Owner side of the autosave worker
#[derive(Debug)]
pub struct AutosaveHandle {
    snapshots: watch::Sender<Option<Arc<Snapshot>>>,
    status: watch::Receiver<SaveStatus>,
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    /// Start the worker on the current tokio runtime
    pub fn spawn(
        store: Arc<dyn DocumentStore>,
        document_id: impl Into<String>,
        debounce: Duration,
    ) -> Self {
        let (snapshots_tx, snapshots_rx) = watch::channel(None);
        let (status_tx, status_rx) = watch::channel(SaveStatus::Idle);
        let (commands_tx, commands_rx) = mpsc::channel(8);

        let worker = Worker {
            store,
            document_id: document_id.into(),
            debounce,
            snapshots: snapshots_rx,
            commands: commands_rx,
            status: status_tx,
            saved_revision: None,
        };
        let task = tokio::spawn(worker.run());

        Self {
            snapshots: snapshots_tx,
            status: status_rx,
            commands: commands_tx,
            task,
        }
    }

    /// Offer a newer snapshot. Never blocks.
    pub fn schedule(&self, revision: u64, document: RawDocument) {
        self.snapshots
            .send_replace(Some(Arc::new(Snapshot { revision, document })));
    }

    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Save the newest snapshot now and wait for the store to acknowledge it
    pub async fn flush(&self) -> Result<(), EditorError> {
        let (ack, done) = oneshot::channel();
        self.commands
            .send(Command::Flush(ack))
            .await
            .map_err(|_| EditorError::AutosaveStopped)?;
        done.await.map_err(|_| EditorError::AutosaveStopped)??;
        Ok(())
    }

    /// Stop the worker. Snapshots not yet saved are dropped; call `flush`
    /// first to keep them.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown).await;
        if let Err(e) = self.task.await {
            warn!(error = %e, "Autosave worker ended abnormally");
        }
    }
}

struct Worker {
    store: Arc<dyn DocumentStore>,
    document_id: String,
    debounce: Duration,
    snapshots: watch::Receiver<Option<Arc<Snapshot>>>,
    commands: mpsc::Receiver<Command>,
    status: watch::Sender<SaveStatus>,
    saved_revision: Option<u64>,
}

impl Worker {
    async fn run(mut self) {
        let mut deadline: Option<Instant> = None;

        loop {
            let wake_at = deadline.unwrap_or_else(Instant::now);
            tokio::select! {
                changed = self.snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if self.is_dirty() {
                        deadline = Some(Instant::now() + self.debounce);
                        self.status.send_replace(SaveStatus::Pending);
                    }
                }
                command = self.commands.recv() => match command {
                    Some(Command::Flush(ack)) => {
                        let result = self.save_latest().await;
                        deadline = result.is_err().then(|| Instant::now() + self.debounce);
                        let _ = ack.send(result);
                    }
                    Some(Command::Shutdown) | None => break,
                },
                _ = tokio::time::sleep_until(wake_at), if deadline.is_some() => {
                    deadline = None;
                    if self.save_latest().await.is_err() {
                        deadline = Some(Instant::now() + self.debounce);
                    }
                }
            }
        }

        debug!(document_id = %self.document_id, "Autosave worker stopped");
    }

    fn is_dirty(&self) -> bool {
        self.snapshots
            .borrow()
            .as_ref()
            .is_some_and(|s| self.saved_revision.map_or(true, |saved| s.revision > saved))
    }

    async fn save_latest(&mut self) -> StoreResult<()> {
        let Some(snapshot) = self.snapshots.borrow_and_update().clone() else {
            return Ok(());
        };
        let revision = snapshot.revision;
        if self.saved_revision.is_some_and(|saved| saved >= revision) {
            return Ok(());
        }

        self.status.send_replace(SaveStatus::Saving { revision });
        match self.store.save(&self.document_id, &snapshot.document).await {
            Ok(()) => {
                self.saved_revision = Some(revision);
                info!(document_id = %self.document_id, revision, "Autosaved document");
                let newer_waiting = self.snapshots.has_changed().unwrap_or(false);
                self.status.send_replace(if newer_waiting {
                    SaveStatus::Pending
                } else {
                    SaveStatus::Saved { revision }
                });
                Ok(())
            }
            Err(e) => {
                warn!(document_id = %self.document_id, revision, error = %e, "Autosave failed");
                self.status.send_replace(SaveStatus::Failed {
                    revision,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }
}
