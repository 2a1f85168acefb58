//! Read in-scope questions from the store.

use crate::question::{LicenseTier, Question};
use crate::repository::{Pagination, QuestionStore};
use crate::sync::error::SyncError;
use crate::sync::progress::{ProgressCallback, SyncProgress, emit};

/// Load every question for `tier` (or all tiers), in display-name order.
pub async fn load_questions<S: QuestionStore + ?Sized>(
    store: &S,
    tier: Option<LicenseTier>,
    page_size: u64,
    on_progress: Option<&ProgressCallback>,
) -> Result<Vec<Question>, SyncError> {
    emit(on_progress, SyncProgress::LoadingQuestions);

    let page_size = page_size.max(1);
    let mut questions = Vec::new();
    let mut page = 0u64;

    loop {
        let batch = store
            .fetch_page(tier, Pagination::new(page, page_size))
            .await?;
        let count = batch.len();
        questions.extend(batch);

        if (count as u64) < page_size {
            break;
        }
        page += 1;
    }

    tracing::debug!(total = questions.len(), license = ?tier, "Loaded questions");
    emit(
        on_progress,
        SyncProgress::QuestionsLoaded {
            total: questions.len(),
        },
    );
    Ok(questions)
}
