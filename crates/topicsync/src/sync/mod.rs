//! Forum topic synchronization.
//!
//! # Module Structure
//!
//! - [`types`] - `SyncConfig`, batch limits and default constants
//! - [`request`] / [`response`] - The inbound action and its JSON responses
//! - [`progress`] - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`engine`] - `run_sync()` and `run_dry_run()` and the steps they share
//! - [`context`] - `SyncContext`, a builder over the engine
//!
//! # Example
//!
//! ```ignore
//! use topicsync::sync::{SyncConfig, SyncProgress, run_dry_run};
//!
//! let preview = run_dry_run(&forum, &db, &SyncConfig::default(), None, None, None).await?;
//! println!("{} topics to create", preview.summary.total_to_create);
//! ```

pub mod context;
pub mod engine;
mod error;
pub mod progress;
pub mod request;
pub mod response;
pub mod types;

pub use context::{SyncContext, SyncContextBuilder, SyncContextError};
pub use error::SyncError;

pub use types::{BatchLimits, CategoryNames, SyncConfig, clamp_batch_size};

pub use types::{
    DEFAULT_BATCH_SIZE, DEFAULT_TOPIC_PAGE_SIZE, INITIAL_BACKOFF_MS, MAX_BACKOFF_MS,
    MAX_BATCH_SIZE, MAX_PREVIEW_EXAMPLES, MAX_PREVIEW_IDS, MAX_REQUEST_RETRIES, MAX_TOPIC_PAGES,
    MIN_BATCH_SIZE, PERSIST_INITIAL_BACKOFF_MS, PERSIST_MAX_RETRIES, PREVIEW_BODY_CHARS,
    QUESTION_PAGE_SIZE, SECONDS_PER_TOPIC,
};

pub use progress::{ProgressCallback, SyncProgress, emit};

pub use request::{SyncAction, SyncRequest, SyncRequestBody};
pub use response::{
    BatchSummary, CategoryPreview, DryRunResponse, DryRunSummary, IdList, ItemDetail, ItemStatus,
    ProgressSummary, SyncOutcome, SyncResponse, TopicPreview,
};

pub use engine::reconcile::ReconcileOutcome;
pub use engine::report::{estimate_sync_time, remaining_batches};
pub use engine::{run_dry_run, run_sync};
