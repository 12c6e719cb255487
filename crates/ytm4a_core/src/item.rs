use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Folder whose items must carry a ticker symbol.
pub const TICKER_FOLDER: &str = "Economics";

/// Folder assumed for records written before folders existed.
pub const DEFAULT_FOLDER: &str = "General";

/// Error text recorded on items recovered by the staleness check.
pub const STALE_REASON: &str = "Processing timed out";

pub fn folder_requires_ticker(folder: &str) -> bool {
    folder == TICKER_FOLDER
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

impl ItemStatus {
    /// Pending and failed items are picked up by a processing run.
    pub fn is_eligible(self) -> bool {
        matches!(self, ItemStatus::Pending | ItemStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Complete => "complete",
            ItemStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One capture-and-process request.
///
/// Field names follow the persisted record, so items written by older
/// versions (without `folder`, `lastUpdated`, `completedAt` or `error`) still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    id: String,
    url: String,
    title: String,
    #[serde(default = "default_folder")]
    folder: String,
    #[serde(default)]
    ticker_symbol: Option<String>,
    status: ItemStatus,
    #[serde(rename = "addedAt")]
    added_at: DateTime<Utc>,
    #[serde(
        rename = "lastUpdated",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    last_updated: Option<DateTime<Utc>>,
    #[serde(
        rename = "completedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn default_folder() -> String {
    DEFAULT_FOLDER.to_string()
}

impl QueueItem {
    pub(crate) fn new(
        id: String,
        url: String,
        title: String,
        folder: String,
        ticker_symbol: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            url,
            title,
            folder,
            ticker_symbol,
            status: ItemStatus::Pending,
            added_at: now,
            last_updated: Some(now),
            completed_at: None,
            error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn ticker_symbol(&self) -> Option<&str> {
        self.ticker_symbol.as_deref()
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Instant the current status was entered; older records fall back to `addedAt`.
    pub fn status_since(&self) -> DateTime<Utc> {
        self.last_updated.unwrap_or(self.added_at)
    }

    /// True when the item has sat in `processing` for longer than `threshold`.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        if self.status != ItemStatus::Processing {
            return false;
        }
        match (now - self.status_since()).to_std() {
            Ok(elapsed) => elapsed > threshold,
            // Timestamp in the future: clock skew, not abandonment.
            Err(_) => false,
        }
    }

    pub(crate) fn mark_processing(&mut self, now: DateTime<Utc>) {
        self.status = ItemStatus::Processing;
        self.error = None;
        self.last_updated = Some(now);
    }

    pub(crate) fn mark_complete(&mut self, now: DateTime<Utc>) {
        self.status = ItemStatus::Complete;
        self.error = None;
        self.completed_at = Some(now);
        self.last_updated = Some(now);
    }

    pub(crate) fn mark_failed(&mut self, reason: String, now: DateTime<Utc>) {
        self.status = ItemStatus::Failed;
        self.error = Some(reason);
        self.last_updated = Some(now);
    }
}
