use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::view_model::QueueViewModel;
use crate::{
    extract_video_id, folder_requires_ticker, is_supported_page, ConflictError, ItemStatus,
    QueueItem, TransitionError, ValidationError, STALE_REASON,
};

/// Time an item may stay in `processing` before a refresh presumes it abandoned.
pub const DEFAULT_STALENESS_THRESHOLD: Duration = Duration::from_secs(5 * 60);

/// User input for a new queue item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueRequest {
    pub url: String,
    pub title: String,
    pub folder: String,
    pub ticker_symbol: Option<String>,
    /// Set after the user confirmed adding a video that is already queued.
    pub allow_duplicate: bool,
}

impl EnqueueRequest {
    pub fn new(url: impl Into<String>, title: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            folder: folder.into(),
            ticker_symbol: None,
            allow_duplicate: false,
        }
    }

    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker_symbol = Some(ticker.into());
        self
    }

    pub fn allowing_duplicate(mut self) -> Self {
        self.allow_duplicate = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Added(QueueItem),
    /// Same video already queued; nothing was added. Re-submit with
    /// `allow_duplicate` once the user confirms.
    DuplicateFound { existing: QueueItem },
}

/// Ordered working copy of the queue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Queue {
    items: Vec<QueueItem>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<QueueItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&QueueItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|item| item.id().to_string()).collect()
    }

    pub fn view(&self) -> QueueViewModel {
        QueueViewModel::from_items(&self.items)
    }

    /// Swap in a freshly loaded sequence, discarding the working copy.
    pub fn replace_all(&mut self, items: Vec<QueueItem>) {
        self.items = items;
    }

    pub fn find_duplicate(&self, url: &str) -> Option<&QueueItem> {
        let video_id = extract_video_id(url)?;
        self.items
            .iter()
            .find(|item| extract_video_id(item.url()).as_deref() == Some(video_id.as_str()))
    }

    pub fn enqueue(
        &mut self,
        request: &EnqueueRequest,
        now: DateTime<Utc>,
    ) -> Result<EnqueueOutcome, ValidationError> {
        if !is_supported_page(&request.url) {
            return Err(ValidationError::UnsupportedPage);
        }
        let title = request.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let ticker_symbol = if folder_requires_ticker(&request.folder) {
            let ticker = request.ticker_symbol.as_deref().map(str::trim).unwrap_or("");
            if ticker.is_empty() {
                return Err(ValidationError::MissingTicker {
                    folder: request.folder.clone(),
                });
            }
            Some(ticker.to_string())
        } else {
            None
        };

        if !request.allow_duplicate {
            if let Some(existing) = self.find_duplicate(&request.url) {
                return Ok(EnqueueOutcome::DuplicateFound {
                    existing: existing.clone(),
                });
            }
        }

        let item = QueueItem::new(
            self.next_id(now),
            request.url.trim().to_string(),
            title.to_string(),
            request.folder.clone(),
            ticker_symbol,
            now,
        );
        self.items.push(item.clone());
        Ok(EnqueueOutcome::Added(item))
    }

    /// `pending | failed -> processing`. Returns the item as it should be submitted.
    pub fn begin_processing(
        &mut self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<QueueItem, TransitionError> {
        let item = self.get_mut(id)?;
        if !item.status().is_eligible() {
            return Err(TransitionError::NotEligible {
                id: id.to_string(),
                status: item.status(),
            });
        }
        item.mark_processing(now);
        Ok(item.clone())
    }

    /// `processing -> complete`.
    pub fn complete(&mut self, id: &str, now: DateTime<Utc>) -> Result<(), TransitionError> {
        let item = self.processing_item_mut(id)?;
        item.mark_complete(now);
        Ok(())
    }

    /// `processing -> failed`, recording `reason` as the item error.
    pub fn fail(
        &mut self,
        id: &str,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        let item = self.processing_item_mut(id)?;
        item.mark_failed(reason.into(), now);
        Ok(())
    }

    /// Removes the item with `id`. Unknown ids are a no-op returning `None`.
    pub fn remove(&mut self, id: &str) -> Result<Option<QueueItem>, ConflictError> {
        let Some(index) = self.items.iter().position(|item| item.id() == id) else {
            return Ok(None);
        };
        if self.items[index].status() == ItemStatus::Processing {
            return Err(ConflictError::ItemProcessing { id: id.to_string() });
        }
        Ok(Some(self.items.remove(index)))
    }

    /// Drops every item, including in-flight ones. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        count
    }

    /// Fails every item stuck in `processing` past `threshold`. Returns the recovered ids.
    pub fn reconcile_stale(&mut self, now: DateTime<Utc>, threshold: Duration) -> Vec<String> {
        let mut recovered = Vec::new();
        for item in self
            .items
            .iter_mut()
            .filter(|item| item.is_stale(now, threshold))
        {
            item.mark_failed(STALE_REASON.to_string(), now);
            recovered.push(item.id().to_string());
        }
        recovered
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut QueueItem, TransitionError> {
        self.items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| TransitionError::NotFound { id: id.to_string() })
    }

    fn processing_item_mut(&mut self, id: &str) -> Result<&mut QueueItem, TransitionError> {
        let item = self.get_mut(id)?;
        if item.status() != ItemStatus::Processing {
            return Err(TransitionError::NotProcessing {
                id: id.to_string(),
                status: item.status(),
            });
        }
        Ok(item)
    }

    /// Millisecond timestamp, bumped past any existing numeric id.
    fn next_id(&self, now: DateTime<Utc>) -> String {
        let candidate = now.timestamp_millis();
        let highest = self
            .items
            .iter()
            .filter_map(|item| item.id().parse::<i64>().ok())
            .max();
        let next = match highest {
            Some(max) if max >= candidate => max.checked_add(1),
            _ => Some(candidate),
        };
        match next {
            Some(id) => id.to_string(),
            None => self.suffixed_id(candidate),
        }
    }

    /// `<millis>-<n>` for the first free `n`; used once numeric ids are exhausted.
    fn suffixed_id(&self, millis: i64) -> String {
        let mut n: u64 = 1;
        loop {
            let id = format!("{millis}-{n}");
            if self.get(&id).is_none() {
                return id;
            }
            n += 1;
        }
    }
}
