//! Queue core: item state machine, validation and view-model helpers.
//!
//! Everything here is synchronous and free of IO; timestamps are passed in by
//! the caller so the async engine (and tests) control the clock.
mod error;
mod item;
mod state;
mod video;
mod view_model;

pub use error::{ConflictError, TransitionError, ValidationError};
pub use item::{
    folder_requires_ticker, ItemStatus, QueueItem, DEFAULT_FOLDER, STALE_REASON, TICKER_FOLDER,
};
pub use state::{EnqueueOutcome, EnqueueRequest, Queue, DEFAULT_STALENESS_THRESHOLD};
pub use video::{extract_video_id, is_supported_page};
pub use view_model::{ClearPrompt, Headline, ItemDetails, QueueRowView, QueueViewModel};
