use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use ytm4a_core::{
    ClearPrompt, ConflictError, EnqueueOutcome, EnqueueRequest, ItemDetails, ItemStatus, Queue,
    QueueItem, QueueViewModel, ValidationError, DEFAULT_STALENESS_THRESHOLD,
};
use ytm4a_logging::{queue_debug, queue_info, queue_warn};

use crate::{ProcessSummary, ProcessingService, QueueStore, SubmitRequest, SubmitResponse};

/// Source of "now" for every timestamp the engine writes.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

#[derive(Clone)]
pub struct EngineConfig {
    pub staleness_threshold: Duration,
    pub clock: Clock,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            staleness_threshold: DEFAULT_STALENESS_THRESHOLD,
            clock: system_clock(),
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("staleness_threshold", &self.staleness_threshold)
            .finish_non_exhaustive()
    }
}

/// Errors that abort an engine operation. Everything else degrades a single item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error("queue processing is already running")]
    AlreadyRunning,
    #[error("queue is empty")]
    QueueEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueResult {
    Added {
        item: QueueItem,
        queue: Vec<QueueItem>,
    },
    /// Nothing was added; ask the user, then retry with `allow_duplicate`.
    DuplicateFound { existing: QueueItem },
}

/// Owns the working copy of the queue for one session.
///
/// Every mutation is written to the store before the call returns. At most
/// one `process_all` runs at a time and it keeps a single request in flight.
pub struct QueueEngine {
    store: Arc<dyn QueueStore>,
    processor: Arc<dyn ProcessingService>,
    config: EngineConfig,
    queue: Mutex<Queue>,
    running: AtomicBool,
}

impl QueueEngine {
    /// Engine with an empty working copy; call [`QueueEngine::reload`] or use
    /// [`QueueEngine::open`] to pick up stored items.
    pub fn new(
        store: Arc<dyn QueueStore>,
        processor: Arc<dyn ProcessingService>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            processor,
            config,
            queue: Mutex::new(Queue::new()),
            running: AtomicBool::new(false),
        }
    }

    pub async fn open(
        store: Arc<dyn QueueStore>,
        processor: Arc<dyn ProcessingService>,
        config: EngineConfig,
    ) -> Self {
        let engine = Self::new(store, processor, config);
        engine.reload().await;
        engine
    }

    /// Replaces the working copy with whatever the store holds.
    pub async fn reload(&self) -> usize {
        let items = self.store.load().await;
        let mut queue = self.queue.lock().await;
        queue.replace_all(items);
        queue.len()
    }

    pub async fn snapshot(&self) -> Vec<QueueItem> {
        self.queue.lock().await.items().to_vec()
    }

    pub async fn view(&self) -> QueueViewModel {
        self.queue.lock().await.view()
    }

    pub async fn details(&self, id: &str) -> Option<ItemDetails> {
        self.queue.lock().await.get(id).map(ItemDetails::from)
    }

    pub async fn clear_prompt(&self) -> ClearPrompt {
        ClearPrompt::for_items(self.queue.lock().await.items())
    }

    pub fn is_processing(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn enqueue(&self, request: &EnqueueRequest) -> Result<EnqueueResult, EngineError> {
        let mut queue = self.queue.lock().await;
        match queue.enqueue(request, self.now())? {
            EnqueueOutcome::Added(item) => {
                queue_info!(
                    "Enqueued item id={} folder={} url={}",
                    item.id(),
                    item.folder(),
                    item.url()
                );
                self.persist(&queue).await;
                Ok(EnqueueResult::Added {
                    item,
                    queue: queue.items().to_vec(),
                })
            }
            EnqueueOutcome::DuplicateFound { existing } => {
                queue_debug!("Video already queued as id={}", existing.id());
                Ok(EnqueueResult::DuplicateFound { existing })
            }
        }
    }

    /// Hands every pending or failed item to the processing service, in queue order.
    pub async fn process_all(&self) -> Result<ProcessSummary, EngineError> {
        let _run = RunGuard::acquire(&self.running).ok_or(EngineError::AlreadyRunning)?;

        let ids = {
            let queue = self.queue.lock().await;
            if queue.is_empty() {
                return Err(EngineError::QueueEmpty);
            }
            queue.ids()
        };

        let mut summary = ProcessSummary::default();
        for id in ids {
            let Some(item) = self.begin_item(&id, &mut summary).await else {
                continue;
            };

            let request = SubmitRequest::from(&item);
            let result = self
                .processor
                .submit(&request)
                .await
                .and_then(SubmitResponse::into_result);

            let mut queue = self.queue.lock().await;
            let now = self.now();
            let applied = match &result {
                Ok(()) => queue.complete(&id, now),
                Err(err) => queue.fail(&id, err.message.clone(), now),
            };
            if let Err(err) = applied {
                queue_warn!("Discarding outcome for item {}: {}", id, err);
                summary.skipped += 1;
                continue;
            }
            match result {
                Ok(()) => {
                    queue_info!("Item {} complete", id);
                    summary.succeeded += 1;
                }
                Err(err) => {
                    queue_warn!("Item {} failed: {}", id, err);
                    summary.failed += 1;
                }
            }
            self.persist(&queue).await;
        }

        queue_info!(
            "Processing run finished: {} succeeded, {} failed, {} skipped",
            summary.succeeded,
            summary.failed,
            summary.skipped
        );
        Ok(summary)
    }

    /// Reloads from the store and fails items left in `processing` for too long.
    /// Returns the number of recovered items.
    pub async fn refresh(&self) -> usize {
        let items = self.store.load().await;
        let mut queue = self.queue.lock().await;
        queue.replace_all(items);
        let recovered = queue.reconcile_stale(self.now(), self.config.staleness_threshold);
        if !recovered.is_empty() {
            queue_warn!(
                "Recovered {} stuck item(s): {}",
                recovered.len(),
                recovered.join(", ")
            );
            self.persist(&queue).await;
        }
        recovered.len()
    }

    /// Unknown ids are a no-op returning `Ok(None)`.
    pub async fn remove(&self, id: &str) -> Result<Option<QueueItem>, EngineError> {
        let mut queue = self.queue.lock().await;
        let removed = queue.remove(id)?;
        if removed.is_some() {
            queue_info!("Removed item {}", id);
            self.persist(&queue).await;
        }
        Ok(removed)
    }

    /// Drops every item unconditionally; confirmation is the caller's concern.
    pub async fn clear(&self) -> usize {
        let mut queue = self.queue.lock().await;
        let dropped = queue.clear();
        queue_info!("Cleared {} item(s)", dropped);
        self.persist(&queue).await;
        dropped
    }

    /// Moves one item into `processing` and persists, or tallies why it was passed over.
    async fn begin_item(&self, id: &str, summary: &mut ProcessSummary) -> Option<QueueItem> {
        let mut queue = self.queue.lock().await;
        let status = match queue.get(id) {
            Some(item) => item.status(),
            None => {
                queue_debug!("Item {} left the queue before its turn", id);
                summary.skipped += 1;
                return None;
            }
        };
        match status {
            ItemStatus::Complete => {
                summary.succeeded += 1;
                return None;
            }
            ItemStatus::Processing => {
                queue_warn!("Item {} is already processing; leaving it for refresh", id);
                summary.skipped += 1;
                return None;
            }
            ItemStatus::Pending | ItemStatus::Failed => {}
        }

        match queue.begin_processing(id, self.now()) {
            Ok(item) => {
                queue_info!("Processing item {} ({})", id, item.url());
                self.persist(&queue).await;
                Some(item)
            }
            Err(err) => {
                queue_warn!("Cannot start item {}: {}", id, err);
                summary.skipped += 1;
                None
            }
        }
    }

    async fn persist(&self, queue: &Queue) {
        self.store.save(queue.items()).await;
    }

    fn now(&self) -> DateTime<Utc> {
        (self.config.clock)()
    }
}

/// Holds the single-run flag for the duration of `process_all`.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
