//! Response shapes, serialized as camelCase JSON.

use serde::Serialize;

use crate::question::LicenseTier;

/// Result of one handled request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SyncOutcome {
    Sync(SyncResponse),
    DryRun(DryRunResponse),
}

impl SyncOutcome {
    pub fn success(&self) -> bool {
        match self {
            SyncOutcome::Sync(r) => r.success,
            SyncOutcome::DryRun(r) => r.success,
        }
    }
}

/// Response to a `sync` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// True when the batch had no errors and no partial writes.
    pub success: bool,
    /// True when nothing is left to create.
    pub complete: bool,
    pub batch: BatchSummary,
    pub progress: ProgressSummary,
    pub details: Vec<ItemDetail>,
    /// Instruction for the caller while work remains.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub processed: usize,
    pub created: usize,
    pub linked: usize,
    pub errors: usize,
    pub partial: usize,
    pub skipped_as_existing: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub total_questions: usize,
    pub already_synced: usize,
    pub remaining_to_create: usize,
    pub estimated_batches_remaining: usize,
    pub batch_size: usize,
}

/// What happened to one question in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// A new topic was created and recorded.
    Created,
    /// An existing topic was found after a duplicate-title conflict.
    Linked,
    /// The forum step failed.
    Error,
    /// The forum step succeeded but the database write did not.
    Partial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    /// Display name of the question.
    pub question_id: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response to a `dry-run` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunResponse {
    pub success: bool,
    pub dry_run: bool,
    pub summary: DryRunSummary,
    pub categories: Vec<CategoryPreview>,
    pub to_create_ids: IdList,
    pub existing_ids: IdList,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunSummary {
    pub total_questions: usize,
    pub total_to_create: usize,
    pub total_existing: usize,
    pub batch_size: usize,
    pub estimated_batches: usize,
    pub estimated_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPreview {
    pub license: LicenseTier,
    pub category_id: i64,
    pub category_slug: String,
    pub to_create: usize,
    pub existing: usize,
    pub examples: Vec<TopicPreview>,
}

/// A rendered example topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPreview {
    pub question_id: String,
    pub title: String,
    pub body_preview: String,
}

/// The first few display names of a longer list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdList {
    pub ids: Vec<String>,
    pub total: usize,
    pub truncated: bool,
}

impl IdList {
    /// Keep at most `limit` names, remembering the full count.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>, limit: usize) -> Self {
        let mut ids = Vec::new();
        let mut total = 0;
        for name in names {
            if ids.len() < limit {
                ids.push(name.to_string());
            }
            total += 1;
        }
        Self {
            truncated: total > ids.len(),
            ids,
            total,
        }
    }
}
