use std::cmp::Reverse;

use chrono::{DateTime, Utc};

use crate::{ItemStatus, QueueItem};

/// Summary line shown above the queue list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Headline {
    Empty,
    Processing(usize),
    Ready(usize),
    AllProcessed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRowView {
    pub id: String,
    pub title: String,
    pub status: ItemStatus,
    pub error: Option<String>,
    /// In-flight items cannot be removed.
    pub removable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueViewModel {
    pub headline: Headline,
    pub rows: Vec<QueueRowView>,
    pub ready_count: usize,
    pub processing_count: usize,
    pub can_process: bool,
    pub can_clear: bool,
}

impl QueueViewModel {
    pub fn from_items(items: &[QueueItem]) -> Self {
        let ready_count = items
            .iter()
            .filter(|item| item.status().is_eligible())
            .count();
        let processing_count = items
            .iter()
            .filter(|item| item.status() == ItemStatus::Processing)
            .count();

        let headline = if items.is_empty() {
            Headline::Empty
        } else if processing_count > 0 {
            Headline::Processing(processing_count)
        } else if ready_count > 0 {
            Headline::Ready(ready_count)
        } else {
            Headline::AllProcessed
        };

        let mut sorted: Vec<&QueueItem> = items.iter().collect();
        sorted.sort_by_key(|item| (display_rank(item.status()), Reverse(item.added_at())));

        let rows = sorted
            .into_iter()
            .map(|item| QueueRowView {
                id: item.id().to_string(),
                title: item.title().to_string(),
                status: item.status(),
                error: item.error().map(str::to_string),
                removable: item.status() != ItemStatus::Processing,
            })
            .collect();

        Self {
            headline,
            rows,
            ready_count,
            processing_count,
            can_process: ready_count > 0,
            can_clear: !items.is_empty(),
        }
    }
}

fn display_rank(status: ItemStatus) -> u8 {
    match status {
        ItemStatus::Processing => 0,
        ItemStatus::Pending => 1,
        ItemStatus::Failed => 2,
        ItemStatus::Complete => 3,
    }
}

/// Everything shown when a single item is inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDetails {
    pub title: String,
    pub folder: String,
    pub status: ItemStatus,
    pub added_at: DateTime<Utc>,
    pub ticker_symbol: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl From<&QueueItem> for ItemDetails {
    fn from(item: &QueueItem) -> Self {
        Self {
            title: item.title().to_string(),
            folder: item.folder().to_string(),
            status: item.status(),
            added_at: item.added_at(),
            ticker_symbol: item.ticker_symbol().map(str::to_string),
            completed_at: item.completed_at(),
            error: item.error().map(str::to_string),
        }
    }
}

/// Which confirmation, if any, a front end should ask for before clearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearPrompt {
    /// Some items are still in flight.
    NeedsProcessingConfirmation,
    AlreadyEmpty,
    NeedsConfirmation,
}

impl ClearPrompt {
    pub fn for_items(items: &[QueueItem]) -> Self {
        if items
            .iter()
            .any(|item| item.status() == ItemStatus::Processing)
        {
            ClearPrompt::NeedsProcessingConfirmation
        } else if items.is_empty() {
            ClearPrompt::AlreadyEmpty
        } else {
            ClearPrompt::NeedsConfirmation
        }
    }
}
