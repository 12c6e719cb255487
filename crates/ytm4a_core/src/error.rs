use thiserror::Error;

use crate::ItemStatus;

/// Rejected enqueue input. The queue is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please navigate to a YouTube video first")]
    UnsupportedPage,
    #[error("please enter a title for the video")]
    EmptyTitle,
    #[error("please enter a ticker symbol for {folder} videos")]
    MissingTicker { folder: String },
}

/// Operation refused because the target item is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("can't remove item {id} while it is processing")]
    ItemProcessing { id: String },
}

/// A status change the item state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("no queue item with id {id}")]
    NotFound { id: String },
    #[error("item {id} is {status} and cannot start processing")]
    NotEligible { id: String, status: ItemStatus },
    #[error("item {id} is {status}, expected processing")]
    NotProcessing { id: String, status: ItemStatus },
}
