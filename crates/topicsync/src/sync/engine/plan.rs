//! Split questions into "to create" and "already on the forum".

use std::collections::HashSet;

use crate::question::{LicenseTier, Question};
use crate::sync::engine::categories::ResolvedCategories;
use crate::sync::engine::report::{estimate_sync_time, remaining_batches};
use crate::sync::response::{
    CategoryPreview, DryRunResponse, DryRunSummary, IdList, TopicPreview,
};
use crate::sync::types::SyncConfig;
use crate::topic::{format_topic_body, format_topic_title, truncate_preview};

/// Questions partitioned against the forum scan, both in display-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    pub to_create: Vec<Question>,
    pub existing: Vec<Question>,
}

impl BatchPlan {
    pub fn total_questions(&self) -> usize {
        self.to_create.len() + self.existing.len()
    }

    /// The questions this call will handle.
    pub fn batch(&self, batch_size: usize) -> &[Question] {
        &self.to_create[..batch_size.min(self.to_create.len())]
    }

    pub fn skipped_as_existing(&self) -> usize {
        self.existing.len()
    }
}

/// Partition `questions` by whether their display name was found on the forum.
pub fn plan_batch(mut questions: Vec<Question>, on_forum: &HashSet<String>) -> BatchPlan {
    questions.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    let (existing, to_create): (Vec<Question>, Vec<Question>) = questions
        .into_iter()
        .partition(|q| on_forum.contains(&q.display_name));
    BatchPlan {
        to_create,
        existing,
    }
}

fn preview(question: &Question, body_chars: usize) -> TopicPreview {
    TopicPreview {
        question_id: question.display_name.clone(),
        title: format_topic_title(&question.display_name, &question.question),
        body_preview: truncate_preview(&format_topic_body(question), body_chars),
    }
}

fn in_tier(tier: LicenseTier) -> impl Fn(&&Question) -> bool {
    move |q| q.tier() == Some(tier)
}

/// Describe what a sync would do, without doing any of it.
pub fn build_preview(
    plan: &BatchPlan,
    categories: &ResolvedCategories,
    tiers: &[LicenseTier],
    batch_size: usize,
    config: &SyncConfig,
) -> DryRunResponse {
    let category_previews = tiers
        .iter()
        .filter_map(|&tier| categories.get(tier).map(|category| (tier, category)))
        .map(|(tier, category)| CategoryPreview {
            license: tier,
            category_id: category.id,
            category_slug: category.slug.clone(),
            to_create: plan.to_create.iter().filter(in_tier(tier)).count(),
            existing: plan.existing.iter().filter(in_tier(tier)).count(),
            examples: plan
                .to_create
                .iter()
                .filter(in_tier(tier))
                .take(config.preview_examples)
                .map(|q| preview(q, config.preview_body_chars))
                .collect(),
        })
        .collect();

    let total_to_create = plan.to_create.len();

    DryRunResponse {
        success: true,
        dry_run: true,
        summary: DryRunSummary {
            total_questions: plan.total_questions(),
            total_to_create,
            total_existing: plan.existing.len(),
            batch_size,
            estimated_batches: remaining_batches(total_to_create, batch_size),
            estimated_time: estimate_sync_time(total_to_create as u64 * config.seconds_per_topic),
        },
        categories: category_previews,
        to_create_ids: IdList::from_names(
            plan.to_create.iter().map(|q| q.display_name.as_str()),
            config.preview_ids,
        ),
        existing_ids: IdList::from_names(
            plan.existing.iter().map(|q| q.display_name.as_str()),
            config.preview_ids,
        ),
    }
}
