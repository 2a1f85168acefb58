//! Discover which questions already have a forum topic.
//!
//! The forum is the source of truth here; the database sync status is not
//! consulted.

use std::collections::HashSet;

use crate::forum::{ForumApi, ForumCategory};
use crate::question::LicenseTier;
use crate::sync::error::SyncError;
use crate::sync::progress::{ProgressCallback, SyncProgress, emit};
use crate::topic::extract_question_id_from_title;

/// Page through one category and collect the display names found in
/// topic titles.
///
/// Stops at the first short page, or after `max_pages` pages with a
/// warning.
pub async fn scan_category<F: ForumApi + ?Sized>(
    forum: &F,
    tier: LicenseTier,
    category: &ForumCategory,
    max_pages: u32,
    on_progress: Option<&ProgressCallback>,
) -> Result<HashSet<String>, SyncError> {
    emit(
        on_progress,
        SyncProgress::ScanningCategory {
            license: tier,
            category: category.name.clone(),
        },
    );

    let mut found = HashSet::new();
    let mut page = 0u32;

    loop {
        let topics = forum.list_category_topics(category, page).await?;

        found.extend(
            topics
                .topics
                .iter()
                .filter_map(|t| extract_question_id_from_title(&t.title))
                .map(str::to_string),
        );

        tracing::debug!(
            category = %category.slug,
            page,
            topics = topics.topics.len(),
            found = found.len(),
            "Scanned topic page"
        );
        emit(
            on_progress,
            SyncProgress::ScannedPage {
                license: tier,
                page,
                count: topics.topics.len(),
                found_so_far: found.len(),
            },
        );

        if topics.is_last() {
            break;
        }

        page += 1;
        if page >= max_pages {
            let message = format!(
                "Stopped scanning '{}' after {} pages; later topics were not checked",
                category.name, max_pages
            );
            tracing::warn!(category = %category.slug, max_pages, "Topic scan page ceiling reached");
            emit(on_progress, SyncProgress::Warning { message });
            break;
        }
    }

    Ok(found)
}

/// Scan every given category and merge the results.
pub async fn scan_existing_topics<'a, F, I>(
    forum: &F,
    categories: I,
    max_pages: u32,
    on_progress: Option<&ProgressCallback>,
) -> Result<HashSet<String>, SyncError>
where
    F: ForumApi + ?Sized,
    I: IntoIterator<Item = (LicenseTier, &'a ForumCategory)>,
{
    let mut existing = HashSet::new();
    for (tier, category) in categories {
        existing.extend(scan_category(forum, tier, category, max_pages, on_progress).await?);
    }

    emit(
        on_progress,
        SyncProgress::ScanComplete {
            existing: existing.len(),
        },
    );
    Ok(existing)
}
