//! The sync engine.
//!
//! One call handles one batch: resolve categories, scan the forum for
//! topics that already exist, read the in-scope questions, then create
//! topics for the first `batch_size` questions that have none. Nothing is
//! remembered between calls; the next call re-scans and picks up where the
//! forum says this one stopped.
//!
//! # Example
//!
//! ```ignore
//! use topicsync::sync::{SyncConfig, run_sync};
//!
//! let response = run_sync(&forum, &db, &SyncConfig::default(), None, Some(25), None).await?;
//! if !response.complete {
//!     println!("{}", response.next_action.unwrap_or_default());
//! }
//! ```

pub mod categories;
pub mod persist;
pub mod plan;
pub mod reconcile;
pub mod report;
pub mod scan;
pub mod source;

use crate::forum::{ForumApi, ForumCategory};
use crate::question::{LicenseTier, Question};
use crate::repository::QuestionStore;

use self::categories::{ResolvedCategories, resolve_categories};
use self::persist::{PersistOutcome, persist_synced, record_error};
use self::plan::{BatchPlan, build_preview, plan_batch};
use self::reconcile::{ReconcileOutcome, reconcile_question};
use self::report::{build_progress, next_action};
use self::scan::scan_existing_topics;
use self::source::load_questions;
use super::error::SyncError;
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::response::{BatchSummary, DryRunResponse, ItemDetail, ItemStatus, SyncResponse};
use super::types::SyncConfig;

/// What the forum and the store look like right now.
struct Survey {
    categories: ResolvedCategories,
    tiers: Vec<LicenseTier>,
    plan: BatchPlan,
}

async fn survey<F, S>(
    forum: &F,
    store: &S,
    config: &SyncConfig,
    license: Option<LicenseTier>,
    on_progress: Option<&ProgressCallback>,
) -> Result<Survey, SyncError>
where
    F: ForumApi + ?Sized,
    S: QuestionStore + ?Sized,
{
    let categories = resolve_categories(forum, &config.categories, on_progress).await?;

    let tiers: Vec<LicenseTier> = match license {
        Some(tier) => vec![tier],
        None => LicenseTier::ALL.to_vec(),
    };

    let selected: Vec<(LicenseTier, &ForumCategory)> = tiers
        .iter()
        .filter_map(|&tier| categories.get(tier).map(|category| (tier, category)))
        .collect();
    let on_forum = scan_existing_topics(
        forum,
        selected,
        config.max_topic_pages,
        on_progress,
    )
    .await?;

    let questions = load_questions(store, license, config.question_page_size, on_progress).await?;
    let plan = plan_batch(questions, &on_forum);

    Ok(Survey {
        categories,
        tiers,
        plan,
    })
}

/// Tally of item outcomes, kept in step with `details`.
#[derive(Default)]
struct BatchTally {
    summary: BatchSummary,
    details: Vec<ItemDetail>,
}

impl BatchTally {
    fn error(&mut self, question: &Question, message: String) {
        self.summary.errors += 1;
        self.details.push(ItemDetail {
            question_id: question.display_name.clone(),
            status: ItemStatus::Error,
            topic_id: None,
            topic_url: None,
            error: Some(message),
        });
    }

    fn done(
        &mut self,
        question: &Question,
        status: ItemStatus,
        topic_id: i64,
        topic_url: String,
        error: Option<String>,
    ) {
        match status {
            ItemStatus::Created => self.summary.created += 1,
            ItemStatus::Linked => self.summary.linked += 1,
            ItemStatus::Partial => self.summary.partial += 1,
            ItemStatus::Error => self.summary.errors += 1,
        }
        self.details.push(ItemDetail {
            question_id: question.display_name.clone(),
            status,
            topic_id: Some(topic_id),
            topic_url: Some(topic_url),
            error,
        });
    }
}

async fn process_question<F, S>(
    forum: &F,
    store: &S,
    config: &SyncConfig,
    categories: &ResolvedCategories,
    question: &Question,
    tally: &mut BatchTally,
    on_progress: Option<&ProgressCallback>,
) where
    F: ForumApi + ?Sized,
    S: QuestionStore + ?Sized,
{
    let Some(category) = question.tier().and_then(|tier| categories.get(tier)) else {
        let message = format!(
            "Unrecognized license prefix in display name '{}'",
            question.display_name
        );
        tracing::warn!(question_id = %question.display_name, "Skipping question without a license tier");
        emit(
            on_progress,
            SyncProgress::TopicError {
                question_id: question.display_name.clone(),
                error: message.clone(),
            },
        );
        record_error(store, question, &message).await;
        tally.error(question, message);
        return;
    };

    let mut note = None;
    let (topic, status) = match reconcile_question(forum, question, category).await {
        ReconcileOutcome::Created(topic) => {
            emit(
                on_progress,
                SyncProgress::TopicCreated {
                    question_id: question.display_name.clone(),
                    topic_id: topic.id,
                },
            );
            (topic, ItemStatus::Created)
        }
        ReconcileOutcome::Linked(topic) => {
            emit(
                on_progress,
                SyncProgress::TopicLinked {
                    question_id: question.display_name.clone(),
                    topic_id: topic.id,
                },
            );
            if let Some(found_in) = topic.category_id
                && found_in != category.id
            {
                // The scan only covers the tier's category, so this question
                // stays in the plan and is linked again on the next call.
                let message = format!(
                    "Linked topic {} is in category {}, outside '{}'; {} will be linked again on every sync",
                    topic.id, found_in, category.slug, question.display_name
                );
                tracing::warn!(
                    question_id = %question.display_name,
                    topic_id = topic.id,
                    found_in,
                    expected = category.id,
                    "Linked topic lives outside the tier category"
                );
                emit(
                    on_progress,
                    SyncProgress::Warning {
                        message: message.clone(),
                    },
                );
                note = Some(message);
            }
            (topic, ItemStatus::Linked)
        }
        ReconcileOutcome::Failed(message) => {
            tracing::warn!(
                question_id = %question.display_name,
                error = %message,
                "Failed to create topic"
            );
            emit(
                on_progress,
                SyncProgress::TopicError {
                    question_id: question.display_name.clone(),
                    error: message.clone(),
                },
            );
            record_error(store, question, &message).await;
            tally.error(question, message);
            return;
        }
    };

    let topic_url = forum.topic_url(&topic);
    match persist_synced(store, question, &topic_url, &config.persist_retry, on_progress).await {
        PersistOutcome::Saved => tally.done(question, status, topic.id, topic_url, note),
        PersistOutcome::Partial(message) => tally.done(
            question,
            ItemStatus::Partial,
            topic.id,
            topic_url,
            Some(message),
        ),
    }
}

/// Create topics for the next batch of questions that have none.
///
/// `license` limits the run to one tier; `batch_size` is clamped into the
/// configured bounds. Per-question failures are reported in the response
/// and never abort the batch.
///
/// # Errors
///
/// Fails only when categories cannot be resolved, the forum scan fails, or
/// the store cannot be read.
pub async fn run_sync<F, S>(
    forum: &F,
    store: &S,
    config: &SyncConfig,
    license: Option<LicenseTier>,
    batch_size: Option<i64>,
    on_progress: Option<&ProgressCallback>,
) -> Result<SyncResponse, SyncError>
where
    F: ForumApi + ?Sized,
    S: QuestionStore + ?Sized,
{
    let batch_size = config.batch.clamp(batch_size);
    let Survey {
        categories, plan, ..
    } = survey(forum, store, config, license, on_progress).await?;

    let batch = plan.batch(batch_size);
    tracing::info!(
        total = plan.total_questions(),
        existing = plan.skipped_as_existing(),
        to_create = plan.to_create.len(),
        batch = batch.len(),
        "Planned sync batch"
    );
    emit(
        on_progress,
        SyncProgress::BatchPlanned {
            to_create: plan.to_create.len(),
            batch: batch.len(),
            existing: plan.skipped_as_existing(),
        },
    );

    let mut tally = BatchTally::default();
    for (i, question) in batch.iter().enumerate() {
        emit(
            on_progress,
            SyncProgress::CreatingTopic {
                question_id: question.display_name.clone(),
                index: i + 1,
                total: batch.len(),
            },
        );
        process_question(
            forum,
            store,
            config,
            &categories,
            question,
            &mut tally,
            on_progress,
        )
        .await;
    }

    tally.summary.processed = batch.len();
    tally.summary.skipped_as_existing = plan.skipped_as_existing();

    let progress = build_progress(
        plan.total_questions(),
        plan.skipped_as_existing(),
        plan.to_create.len(),
        batch.len(),
        batch_size,
    );
    let remaining = progress.remaining_to_create;

    tracing::info!(
        created = tally.summary.created,
        linked = tally.summary.linked,
        errors = tally.summary.errors,
        partial = tally.summary.partial,
        remaining,
        "Sync batch complete"
    );
    emit(
        on_progress,
        SyncProgress::BatchComplete {
            created: tally.summary.created,
            linked: tally.summary.linked,
            errors: tally.summary.errors,
            partial: tally.summary.partial,
            remaining,
        },
    );

    Ok(SyncResponse {
        success: tally.summary.errors == 0 && tally.summary.partial == 0,
        complete: remaining == 0,
        batch: tally.summary,
        progress,
        details: tally.details,
        next_action: next_action(remaining),
    })
}

/// Report what [`run_sync`] would do without creating or writing anything.
///
/// # Errors
///
/// Same as [`run_sync`].
pub async fn run_dry_run<F, S>(
    forum: &F,
    store: &S,
    config: &SyncConfig,
    license: Option<LicenseTier>,
    batch_size: Option<i64>,
    on_progress: Option<&ProgressCallback>,
) -> Result<DryRunResponse, SyncError>
where
    F: ForumApi + ?Sized,
    S: QuestionStore + ?Sized,
{
    let batch_size = config.batch.clamp(batch_size);
    let survey = survey(forum, store, config, license, on_progress).await?;

    tracing::info!(
        total = survey.plan.total_questions(),
        to_create = survey.plan.to_create.len(),
        existing = survey.plan.skipped_as_existing(),
        "Dry run complete"
    );

    Ok(build_preview(
        &survey.plan,
        &survey.categories,
        &survey.tiers,
        batch_size,
        config,
    ))
}
