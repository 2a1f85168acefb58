use topicsync::sync::SyncProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::ResolvingCategories => {
                tracing::debug!("Resolving forum categories");
            }

            SyncProgress::CategoriesResolved { count } => {
                tracing::debug!(count, "Resolved forum categories");
            }

            SyncProgress::ScanningCategory { license, category } => {
                tracing::info!(license = %license, category = %category, "Scanning category");
            }

            SyncProgress::ScannedPage {
                license,
                page,
                count,
                found_so_far,
            } => {
                tracing::debug!(license = %license, page, count, found_so_far, "Scanned page");
            }

            SyncProgress::ScanComplete { existing } => {
                tracing::info!(existing, "Scan complete");
            }

            SyncProgress::LoadingQuestions => {
                tracing::debug!("Loading questions");
            }

            SyncProgress::QuestionsLoaded { total } => {
                tracing::info!(total, "Questions loaded");
            }

            SyncProgress::BatchPlanned {
                to_create,
                batch,
                existing,
            } => {
                tracing::info!(to_create, batch, existing, "Batch planned");
            }

            SyncProgress::CreatingTopic {
                question_id,
                index,
                total,
            } => {
                tracing::debug!(question_id = %question_id, index, total, "Creating topic");
            }

            SyncProgress::TopicCreated {
                question_id,
                topic_id,
            } => {
                tracing::info!(question_id = %question_id, topic_id, "Created topic");
            }

            SyncProgress::TopicLinked {
                question_id,
                topic_id,
            } => {
                tracing::info!(question_id = %question_id, topic_id, "Linked existing topic");
            }

            SyncProgress::TopicError { question_id, error } => {
                tracing::warn!(question_id = %question_id, error = %error, "Topic failed");
            }

            SyncProgress::PersistRetry {
                question_id,
                retry_after_ms,
                attempt,
            } => {
                tracing::warn!(
                    question_id = %question_id,
                    retry_after_ms,
                    attempt,
                    "Database write failed, backing off"
                );
            }

            SyncProgress::PersistPartial { question_id, error } => {
                tracing::error!(question_id = %question_id, error = %error, "Topic created but not saved");
            }

            SyncProgress::BatchComplete {
                created,
                linked,
                errors,
                partial,
                remaining,
            } => {
                tracing::info!(created, linked, errors, partial, remaining, "Batch complete");
            }

            SyncProgress::Warning { message } => {
                tracing::warn!(message = %message, "Warning");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
