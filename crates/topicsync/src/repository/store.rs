use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::question::{LicenseTier, Question};

use super::errors::Result;
use super::query::Pagination;
use super::{query, single};

/// Question storage as seen by the sync engine and webhook.
///
/// Implemented for [`DatabaseConnection`]; tests substitute in-memory
/// stores to inject failures.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// One page of questions ordered by display name.
    async fn fetch_page(
        &self,
        tier: Option<LicenseTier>,
        pagination: Pagination,
    ) -> Result<Vec<Question>>;

    async fn mark_synced(&self, id: Uuid, forum_url: &str) -> Result<()>;

    async fn mark_error(&self, id: Uuid, message: &str) -> Result<()>;

    /// The question whose `forum_url` points at `topic_id`.
    async fn find_by_topic_id(&self, topic_id: i64) -> Result<Option<Question>>;

    async fn update_explanation(&self, id: Uuid, explanation: &str) -> Result<()>;
}

#[async_trait]
impl QuestionStore for DatabaseConnection {
    async fn fetch_page(
        &self,
        tier: Option<LicenseTier>,
        pagination: Pagination,
    ) -> Result<Vec<Question>> {
        let rows = query::find_page(self, tier, pagination).await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn mark_synced(&self, id: Uuid, forum_url: &str) -> Result<()> {
        single::mark_synced(self, id, forum_url).await
    }

    async fn mark_error(&self, id: Uuid, message: &str) -> Result<()> {
        single::mark_error(self, id, message).await
    }

    async fn find_by_topic_id(&self, topic_id: i64) -> Result<Option<Question>> {
        Ok(query::find_by_topic_id(self, topic_id)
            .await?
            .map(Question::from))
    }

    async fn update_explanation(&self, id: Uuid, explanation: &str) -> Result<()> {
        single::update_explanation(self, id, explanation).await
    }
}

#[async_trait]
impl<T: QuestionStore + ?Sized> QuestionStore for std::sync::Arc<T> {
    async fn fetch_page(
        &self,
        tier: Option<LicenseTier>,
        pagination: Pagination,
    ) -> Result<Vec<Question>> {
        (**self).fetch_page(tier, pagination).await
    }

    async fn mark_synced(&self, id: Uuid, forum_url: &str) -> Result<()> {
        (**self).mark_synced(id, forum_url).await
    }

    async fn mark_error(&self, id: Uuid, message: &str) -> Result<()> {
        (**self).mark_error(id, message).await
    }

    async fn find_by_topic_id(&self, topic_id: i64) -> Result<Option<Question>> {
        (**self).find_by_topic_id(topic_id).await
    }

    async fn update_explanation(&self, id: Uuid, explanation: &str) -> Result<()> {
        (**self).update_explanation(id, explanation).await
    }
}
