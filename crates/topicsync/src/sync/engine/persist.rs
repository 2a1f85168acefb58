//! Record forum results in the question store.

use std::sync::atomic::{AtomicU32, Ordering};

use backon::Retryable;

use crate::question::Question;
use crate::repository::{QuestionStore, RepositoryError};
use crate::retry::RetryConfig;
use crate::sync::progress::{ProgressCallback, SyncProgress, emit};

/// Result of recording a linked topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Saved,
    /// Every attempt failed; the topic exists but the row does not say so.
    Partial(String),
}

/// Mark `question` synced with `topic_url`, retrying transient failures.
pub async fn persist_synced<S: QuestionStore + ?Sized>(
    store: &S,
    question: &Question,
    topic_url: &str,
    retry: &RetryConfig,
    on_progress: Option<&ProgressCallback>,
) -> PersistOutcome {
    let attempt = AtomicU32::new(0);

    let write = || async {
        attempt.fetch_add(1, Ordering::SeqCst);
        store.mark_synced(question.id, topic_url).await
    };

    let result = write
        .retry(retry.clone().into_backoff())
        .notify(|err: &RepositoryError, dur| {
            let current_attempt = attempt.load(Ordering::SeqCst);
            emit(
                on_progress,
                SyncProgress::PersistRetry {
                    question_id: question.display_name.clone(),
                    retry_after_ms: dur.as_millis() as u64,
                    attempt: current_attempt,
                },
            );
            tracing::warn!(
                question_id = %question.display_name,
                attempt = current_attempt,
                retry_after_ms = dur.as_millis() as u64,
                error = %err,
                "Failed to record synced topic, retrying"
            );
        })
        .when(RepositoryError::is_transient)
        .await;

    match result {
        Ok(()) => PersistOutcome::Saved,
        Err(e) => {
            let message = format!("Topic exists at {} but saving it failed: {}", topic_url, e);
            tracing::warn!(
                question_id = %question.display_name,
                attempts = attempt.load(Ordering::SeqCst),
                error = %e,
                "Giving up on recording synced topic"
            );
            emit(
                on_progress,
                SyncProgress::PersistPartial {
                    question_id: question.display_name.clone(),
                    error: e.to_string(),
                },
            );
            PersistOutcome::Partial(message)
        }
    }
}

/// Best-effort record of a per-question failure. Errors are only logged.
pub async fn record_error<S: QuestionStore + ?Sized>(store: &S, question: &Question, message: &str) {
    if let Err(e) = store.mark_error(question.id, message).await {
        tracing::warn!(
            question_id = %question.display_name,
            error = %e,
            "Failed to record sync error"
        );
    }
}
