//! Queue engine: persistence, processing hand-off and the async queue driver.
mod engine;
mod persist;
mod processor;
mod store;
mod types;

pub use engine::{system_clock, Clock, EngineConfig, EngineError, EnqueueResult, QueueEngine};
pub use persist::{ensure_parent_dir, AtomicFileWriter, PersistError};
pub use processor::{ProcessingService, ProcessorSettings, ReqwestProcessor, DEFAULT_ENDPOINT};
pub use store::{JsonFileStore, MemoryStore, QueueStore, StorageFault, QUEUE_STORAGE_KEY};
pub use types::{
    FailureKind, ProcessSummary, RunOutcome, ServiceError, SubmitRequest, SubmitResponse,
    SubmitStatus, DEFAULT_FAILURE_MESSAGE,
};
