use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
};

use crate::entity::question::{Column, Entity as QuestionEntity, Model};
use crate::question::LicenseTier;

use super::errors::{RepositoryError, Result};

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page number (0-indexed).
    pub page: u64,
    /// Items per page.
    pub per_page: u64,
}

const MIN_PER_PAGE: u64 = 1;

impl Pagination {
    /// Create a new pagination with the given page and per_page values.
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page,
            per_page: per_page.max(MIN_PER_PAGE),
        }
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        self.page * self.per_page
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            per_page: MIN_PER_PAGE,
        }
    }
}

fn tier_filter(tier: Option<LicenseTier>) -> Select<QuestionEntity> {
    let select = QuestionEntity::find();
    match tier {
        Some(tier) => select.filter(Column::DisplayName.starts_with(tier.letter().to_string())),
        None => select,
    }
}

// ─── Query Operations ────────────────────────────────────────────────────────

/// One page of questions ordered by display name, optionally limited to a tier.
pub async fn find_page(
    db: &DatabaseConnection,
    tier: Option<LicenseTier>,
    pagination: Pagination,
) -> Result<Vec<Model>> {
    tier_filter(tier)
        .order_by_asc(Column::DisplayName)
        .offset(pagination.offset())
        .limit(pagination.per_page)
        .all(db)
        .await
        .map_err(RepositoryError::from)
}

/// Count questions, optionally limited to a tier.
pub async fn count(db: &DatabaseConnection, tier: Option<LicenseTier>) -> Result<u64> {
    tier_filter(tier)
        .count(db)
        .await
        .map_err(RepositoryError::from)
}

/// Find the question linked to a forum topic.
///
/// Topic URLs end in `/{topic_id}`, so the match is on that suffix.
pub async fn find_by_topic_id(db: &DatabaseConnection, topic_id: i64) -> Result<Option<Model>> {
    QuestionEntity::find()
        .filter(Column::ForumUrl.ends_with(format!("/{}", topic_id)))
        .one(db)
        .await
        .map_err(RepositoryError::from)
}
