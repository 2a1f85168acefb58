//! Sync configuration and constants.
//!
//! Every limit the engine uses lives in [`SyncConfig`]; the constants below
//! are only its defaults.

use crate::question::LicenseTier;
use crate::retry::RetryConfig;

/// Batch size used when the caller does not ask for one.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Smallest accepted batch size.
pub const MIN_BATCH_SIZE: usize = 1;

/// Largest accepted batch size. Keeps one call well inside a request timeout.
pub const MAX_BATCH_SIZE: usize = 100;

/// Rows fetched per question store query.
pub const QUESTION_PAGE_SIZE: u64 = 1000;

/// Soft cap on topic list pages scanned per category.
pub const MAX_TOPIC_PAGES: u32 = 100;

/// Discourse's topic list page size when the response omits `per_page`.
pub const DEFAULT_TOPIC_PAGE_SIZE: usize = 30;

/// Example topics rendered per tier in a dry run.
pub const MAX_PREVIEW_EXAMPLES: usize = 3;

/// Body characters kept in a dry-run example.
pub const PREVIEW_BODY_CHARS: usize = 300;

/// Display names listed in dry-run id lists.
pub const MAX_PREVIEW_IDS: usize = 50;

/// Estimated forum time per created topic, in seconds.
pub const SECONDS_PER_TOPIC: u64 = 1;

/// Maximum backoff delay in milliseconds when rate limited.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Retries for a single forum request after the first attempt.
pub const MAX_REQUEST_RETRIES: usize = 4;

/// First delay before retrying a database write.
pub const PERSIST_INITIAL_BACKOFF_MS: u64 = 1_000;

/// Retries for a database write after the first attempt.
pub const PERSIST_MAX_RETRIES: usize = 3;

/// Bounds for the per-call batch size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub default: usize,
    pub min: usize,
    pub max: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            default: DEFAULT_BATCH_SIZE,
            min: MIN_BATCH_SIZE,
            max: MAX_BATCH_SIZE,
        }
    }
}

impl BatchLimits {
    /// Clamp a requested batch size into `[min, max]`, using the default
    /// when nothing was requested.
    #[must_use]
    pub fn clamp(&self, requested: Option<i64>) -> usize {
        let Some(requested) = requested else {
            return self.default;
        };
        let min = self.min.max(1);
        let max = self.max.max(min);
        usize::try_from(requested).unwrap_or(0).clamp(min, max)
    }
}

/// Clamp a requested batch size using the default limits (1 to 100, 50).
#[must_use]
pub fn clamp_batch_size(requested: Option<i64>) -> usize {
    BatchLimits::default().clamp(requested)
}

/// Forum category name for each license tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNames {
    pub technician: String,
    pub general: String,
    pub extra: String,
}

impl Default for CategoryNames {
    fn default() -> Self {
        Self {
            technician: "Technician Questions".to_string(),
            general: "General Questions".to_string(),
            extra: "Extra Questions".to_string(),
        }
    }
}

impl CategoryNames {
    #[must_use]
    pub fn for_tier(&self, tier: LicenseTier) -> &str {
        match tier {
            LicenseTier::Technician => &self.technician,
            LicenseTier::General => &self.general,
            LicenseTier::Extra => &self.extra,
        }
    }
}

/// Engine configuration, passed in at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub batch: BatchLimits,
    pub question_page_size: u64,
    pub max_topic_pages: u32,
    pub persist_retry: RetryConfig,
    pub categories: CategoryNames,
    pub preview_examples: usize,
    pub preview_body_chars: usize,
    pub preview_ids: usize,
    pub seconds_per_topic: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch: BatchLimits::default(),
            question_page_size: QUESTION_PAGE_SIZE,
            max_topic_pages: MAX_TOPIC_PAGES,
            persist_retry: RetryConfig::persistence(),
            categories: CategoryNames::default(),
            preview_examples: MAX_PREVIEW_EXAMPLES,
            preview_body_chars: PREVIEW_BODY_CHARS,
            preview_ids: MAX_PREVIEW_IDS,
            seconds_per_topic: SECONDS_PER_TOPIC,
        }
    }
}
