//! Progress reporting types for sync operations.
//!
//! The engine reports what it is doing through [`SyncProgress`] events; the
//! CLI turns them into progress bars or log lines.

use crate::question::LicenseTier;

/// Progress events emitted during a sync or dry run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// Fetching the forum's category list.
    ResolvingCategories,

    /// Every in-scope tier has a category.
    CategoriesResolved {
        /// Number of tiers resolved.
        count: usize,
    },

    /// Starting to page through a category's topics.
    ScanningCategory {
        license: LicenseTier,
        category: String,
    },

    /// Scanned one topic list page.
    ScannedPage {
        license: LicenseTier,
        /// Page number (0-indexed).
        page: u32,
        /// Topics on this page.
        count: usize,
        /// Question topics found in this category so far.
        found_so_far: usize,
    },

    /// All in-scope categories scanned.
    ScanComplete {
        /// Distinct questions that already have a topic.
        existing: usize,
    },

    /// Reading questions from the database.
    LoadingQuestions,

    /// All in-scope questions loaded.
    QuestionsLoaded { total: usize },

    /// The batch for this call is known.
    BatchPlanned {
        /// Questions without a topic.
        to_create: usize,
        /// Questions handled by this call.
        batch: usize,
        /// Questions that already have a topic.
        existing: usize,
    },

    /// About to create a topic.
    CreatingTopic {
        question_id: String,
        /// Position in the batch (1-indexed).
        index: usize,
        total: usize,
    },

    /// A new topic was created.
    TopicCreated { question_id: String, topic_id: i64 },

    /// An existing topic was linked after a title conflict.
    TopicLinked { question_id: String, topic_id: i64 },

    /// Creating or linking a topic failed.
    TopicError { question_id: String, error: String },

    /// A database write failed and will be retried.
    PersistRetry {
        question_id: String,
        retry_after_ms: u64,
        attempt: u32,
    },

    /// The topic exists but could not be recorded.
    PersistPartial { question_id: String, error: String },

    /// The batch finished.
    BatchComplete {
        created: usize,
        linked: usize,
        errors: usize,
        partial: usize,
        remaining: usize,
    },

    /// Non-fatal warning.
    Warning { message: String },
}

/// Callback type for progress reporting.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Helper to emit progress events.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_with_callback() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let callback: ProgressCallback = Box::new(move |_event| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        emit(Some(&callback), SyncProgress::ResolvingCategories);
        emit(Some(&callback), SyncProgress::QuestionsLoaded { total: 10 });

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_emit_without_callback() {
        emit(None, SyncProgress::ScanComplete { existing: 3 });
    }

    #[test]
    fn test_sync_progress_debug() {
        let event = SyncProgress::TopicCreated {
            question_id: "T1A01".to_string(),
            topic_id: 42,
        };
        let debug = format!("{:?}", event);
        assert!(debug.contains("TopicCreated"));
        assert!(debug.contains("T1A01"));
    }
}
