//! Discourse forum access.
//!
//! # Module Structure
//!
//! - [`ForumApi`] - The operations the sync engine needs from a forum
//! - `client` - [`ForumClient`], the Discourse REST implementation
//! - `error` - [`ForumError`]
//! - `types` - Topics, categories and the [`CreateTopicOutcome`] union
//! - `rate_limit` - Proactive request pacing

mod client;
mod error;
mod rate_limit;
mod types;

use async_trait::async_trait;

pub use client::ForumClient;
pub use error::ForumError;
pub use rate_limit::{ApiRateLimiter, DISCOURSE_DEFAULT_RPS};
pub use types::{CreateTopicOutcome, ForumCategory, ForumTopic, TopicDraft, TopicPage};

/// Forum operations used by the sync engine.
///
/// [`ForumClient`] implements this against Discourse; tests substitute an
/// in-memory forum.
#[async_trait]
pub trait ForumApi: Send + Sync {
    /// All top-level categories.
    async fn list_categories(&self) -> Result<Vec<ForumCategory>, ForumError>;

    /// One page (0-based) of a category's topics.
    async fn list_category_topics(
        &self,
        category: &ForumCategory,
        page: u32,
    ) -> Result<TopicPage, ForumError>;

    /// Full-text topic search.
    async fn search_topics(&self, query: &str) -> Result<Vec<ForumTopic>, ForumError>;

    /// Create a topic. Every failure is reported through the outcome.
    async fn create_topic(&self, draft: &TopicDraft) -> CreateTopicOutcome;

    /// Public URL of a topic.
    fn topic_url(&self, topic: &ForumTopic) -> String;
}

#[async_trait]
impl<T: ForumApi + ?Sized> ForumApi for std::sync::Arc<T> {
    async fn list_categories(&self) -> Result<Vec<ForumCategory>, ForumError> {
        (**self).list_categories().await
    }

    async fn list_category_topics(
        &self,
        category: &ForumCategory,
        page: u32,
    ) -> Result<TopicPage, ForumError> {
        (**self).list_category_topics(category, page).await
    }

    async fn search_topics(&self, query: &str) -> Result<Vec<ForumTopic>, ForumError> {
        (**self).search_topics(query).await
    }

    async fn create_topic(&self, draft: &TopicDraft) -> CreateTopicOutcome {
        (**self).create_topic(draft).await
    }

    fn topic_url(&self, topic: &ForumTopic) -> String {
        (**self).topic_url(topic)
    }
}
