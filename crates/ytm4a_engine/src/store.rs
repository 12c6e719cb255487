use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use thiserror::Error;
use ytm4a_core::QueueItem;
use ytm4a_logging::{queue_debug, queue_error, queue_warn};

use crate::{AtomicFileWriter, PersistError};

/// Key of the record holding the queue inside the storage file.
pub const QUEUE_STORAGE_KEY: &str = "ytm4a_queue";

/// Durable home of the queue.
///
/// Both operations are fail-soft: faults are logged by the store and never
/// reach the caller. A store that cannot load yields an empty queue; a store
/// that cannot save drops the write.
#[async_trait::async_trait]
pub trait QueueStore: Send + Sync {
    async fn load(&self) -> Vec<QueueItem>;
    async fn save(&self, items: &[QueueItem]);
}

#[derive(Debug, Error)]
pub enum StorageFault {
    #[error(transparent)]
    Io(#[from] PersistError),
    #[error("failed to serialize queue: {0}")]
    Serialize(serde_json::Error),
    #[error("invalid storage record: {0}")]
    Corrupt(serde_json::Error),
    #[error("storage task failed: {0}")]
    Task(String),
}

/// Keeps the queue under [`QUEUE_STORAGE_KEY`] in a JSON object on disk.
///
/// Other keys in the same file are preserved across saves, and so are queue
/// entries this version cannot decode.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    writer: AtomicFileWriter,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            writer: AtomicFileWriter::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }

    pub async fn try_load(&self) -> Result<Vec<QueueItem>, StorageFault> {
        let writer = self.writer.clone();
        let content = tokio::task::spawn_blocking(move || writer.read())
            .await
            .map_err(|err| StorageFault::Task(err.to_string()))??;
        let Some(content) = content else {
            return Ok(Vec::new());
        };
        let mut record: Map<String, Value> =
            serde_json::from_str(&content).map_err(StorageFault::Corrupt)?;
        Ok(decode_items(record.remove(QUEUE_STORAGE_KEY)))
    }

    /// Writes `items` under [`QUEUE_STORAGE_KEY`]. Entries already on disk
    /// that do not decode are written back after them.
    pub async fn try_save(&self, items: &[QueueItem]) -> Result<(), StorageFault> {
        let mut entries = items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StorageFault::Serialize)?;
        let ids: HashSet<String> = items.iter().map(|item| item.id().to_string()).collect();
        let writer = self.writer.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StorageFault> {
            let mut record = match writer.read()? {
                Some(existing) => serde_json::from_str::<Map<String, Value>>(&existing)
                    .unwrap_or_else(|err| {
                        queue_warn!("Replacing unreadable storage record: {}", err);
                        Map::new()
                    }),
                None => Map::new(),
            };
            let kept = undecodable_entries(record.get(QUEUE_STORAGE_KEY), &ids);
            if !kept.is_empty() {
                queue_warn!("Keeping {} unreadable queue item(s) in storage", kept.len());
            }
            entries.extend(kept);
            record.insert(QUEUE_STORAGE_KEY.to_string(), Value::Array(entries));
            let content = serde_json::to_string_pretty(&Value::Object(record))
                .map_err(StorageFault::Serialize)?;
            writer.write(&content)?;
            Ok(())
        })
        .await
        .map_err(|err| StorageFault::Task(err.to_string()))?
    }
}

#[async_trait::async_trait]
impl QueueStore for JsonFileStore {
    async fn load(&self) -> Vec<QueueItem> {
        match self.try_load().await {
            Ok(items) => {
                queue_debug!("Loaded {} queue item(s) from {:?}", items.len(), self.path());
                items
            }
            Err(err) => {
                queue_error!("Failed to load queue from {:?}: {}", self.path(), err);
                Vec::new()
            }
        }
    }

    async fn save(&self, items: &[QueueItem]) {
        match self.try_save(items).await {
            Ok(()) => queue_debug!("Saved {} queue item(s) to {:?}", items.len(), self.path()),
            Err(err) => queue_error!("Failed to save queue to {:?}: {}", self.path(), err),
        }
    }
}

/// Skips individual records that no longer parse instead of losing the whole queue.
/// The skipped entries stay on disk; see [`JsonFileStore::try_save`].
fn decode_items(raw: Option<Value>) -> Vec<QueueItem> {
    let entries = match raw {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            queue_warn!("Ignoring queue record of unexpected shape: {}", other);
            return Vec::new();
        }
    };
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<QueueItem>(entry) {
            Ok(item) => Some(item),
            Err(err) => {
                queue_warn!("Skipping unreadable queue item: {}", err);
                None
            }
        })
        .collect()
}

/// Stored entries that do not decode and do not share an id with `ids`.
fn undecodable_entries(existing: Option<&Value>, ids: &HashSet<String>) -> Vec<Value> {
    let Some(Value::Array(entries)) = existing else {
        return Vec::new();
    };
    entries
        .iter()
        .filter(|entry| serde_json::from_value::<QueueItem>((*entry).clone()).is_err())
        .filter(|entry| {
            entry
                .get("id")
                .and_then(Value::as_str)
                .map_or(true, |id| !ids.contains(id))
        })
        .cloned()
        .collect()
}

/// Volatile store for sessions without durable backing, and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Arc<Mutex<Vec<QueueItem>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<QueueItem>) -> Self {
        Self {
            items: Arc::new(Mutex::new(items)),
        }
    }

    /// What a fresh `load` would return.
    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Overwrite the stored sequence, as another popup instance would.
    pub fn replace(&self, items: Vec<QueueItem>) {
        *self
            .items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = items;
    }
}

#[async_trait::async_trait]
impl QueueStore for MemoryStore {
    async fn load(&self) -> Vec<QueueItem> {
        self.snapshot()
    }

    async fn save(&self, items: &[QueueItem]) {
        self.replace(items.to_vec());
    }
}
