use std::fmt;

use serde::{Deserialize, Serialize};
use ytm4a_core::QueueItem;

/// Recorded when the service reports failure without saying why.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Processing failed";

/// Body posted to the processing endpoint for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub url: String,
    pub category: String,
    pub ticker_symbol: Option<String>,
    pub custom_title: String,
}

impl From<&QueueItem> for SubmitRequest {
    fn from(item: &QueueItem) -> Self {
        Self {
            url: item.url().to_string(),
            category: item.folder().to_string(),
            ticker_symbol: item.ticker_symbol().map(str::to_string),
            custom_title: item.title().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitStatus {
    Success,
    Cancelled,
    /// Any other (or missing) status value.
    #[default]
    #[serde(other)]
    Failure,
}

impl SubmitStatus {
    /// A cancelled job is finished as far as the queue is concerned.
    pub fn is_success(self) -> bool {
        matches!(self, SubmitStatus::Success | SubmitStatus::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub status: SubmitStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SubmitResponse {
    pub fn success() -> Self {
        Self {
            status: SubmitStatus::Success,
            message: None,
        }
    }

    /// Folds a non-success status into a `Rejected` service error.
    pub fn into_result(self) -> Result<(), ServiceError> {
        if self.status.is_success() {
            Ok(())
        } else {
            Err(ServiceError::new(
                FailureKind::Rejected,
                self.message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
            ))
        }
    }
}

/// Why a submission failed. `message` is stored verbatim as the item error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub kind: FailureKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ServiceError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidEndpoint,
    InvalidRequest,
    Network,
    Timeout,
    HttpStatus(u16),
    InvalidResponse,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    /// The service answered with a non-success status.
    Rejected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidEndpoint => write!(f, "invalid endpoint"),
            FailureKind::InvalidRequest => write!(f, "invalid request"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Rejected => write!(f, "rejected by service"),
        }
    }
}

/// Result of one `process_all` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessSummary {
    /// Items that completed in this run plus items that were already complete.
    pub succeeded: usize,
    pub failed: usize,
    /// Items stuck in flight, or removed while the run was underway.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    CompletedWithErrors,
    NothingProcessed,
}

impl ProcessSummary {
    pub fn has_errors(&self) -> bool {
        self.failed > 0
    }

    pub fn outcome(&self) -> RunOutcome {
        if self.has_errors() {
            RunOutcome::CompletedWithErrors
        } else if self.succeeded > 0 {
            RunOutcome::Completed
        } else {
            RunOutcome::NothingProcessed
        }
    }
}
