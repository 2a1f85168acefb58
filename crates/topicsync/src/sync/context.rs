//! Sync context builder.
//!
//! Bundles the forum, the question store, the engine configuration and an
//! optional progress callback so callers only pass the request.
//!
//! # Example
//!
//! ```ignore
//! use topicsync::sync::{SyncContext, SyncRequest};
//!
//! let ctx = SyncContext::builder()
//!     .forum(forum_client)
//!     .store(db)
//!     .progress(callback)
//!     .build()?;
//!
//! let outcome = ctx.handle(SyncRequest::parse("sync", Some("technician"), Some(25))?).await?;
//! ```

use std::sync::Arc;

use crate::forum::ForumApi;
use crate::question::LicenseTier;
use crate::repository::QuestionStore;

use super::engine::{run_dry_run, run_sync};
use super::error::SyncError;
use super::progress::ProgressCallback;
use super::request::{SyncAction, SyncRequest};
use super::response::{DryRunResponse, SyncOutcome, SyncResponse};
use super::types::SyncConfig;

/// Error type for sync context construction.
#[derive(Debug, thiserror::Error)]
pub enum SyncContextError {
    /// Missing required field in builder.
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },
}

/// Result type for sync context construction.
pub type Result<T> = std::result::Result<T, SyncContextError>;

/// Builder for creating a `SyncContext`.
pub struct SyncContextBuilder<F, S> {
    forum: Option<F>,
    store: Option<S>,
    config: Option<SyncConfig>,
    progress: Option<Arc<ProgressCallback>>,
}

impl<F, S> Default for SyncContextBuilder<F, S> {
    fn default() -> Self {
        Self {
            forum: None,
            store: None,
            config: None,
            progress: None,
        }
    }
}

impl<F: ForumApi, S: QuestionStore> SyncContextBuilder<F, S> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the forum client.
    pub fn forum(mut self, forum: F) -> Self {
        self.forum = Some(forum);
        self
    }

    /// Set the question store.
    pub fn store(mut self, store: S) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the engine configuration. Defaults to [`SyncConfig::default`].
    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the progress callback.
    pub fn progress(mut self, callback: Arc<ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Build the sync context.
    ///
    /// # Errors
    ///
    /// Returns `SyncContextError::MissingField` if the forum or store is not set.
    pub fn build(self) -> Result<SyncContext<F, S>> {
        let forum = self
            .forum
            .ok_or(SyncContextError::MissingField { field: "forum" })?;
        let store = self
            .store
            .ok_or(SyncContextError::MissingField { field: "store" })?;

        Ok(SyncContext {
            forum,
            store,
            config: self.config.unwrap_or_default(),
            progress: self.progress,
        })
    }
}

/// Everything a sync call needs besides the request itself.
pub struct SyncContext<F, S> {
    forum: F,
    store: S,
    config: SyncConfig,
    progress: Option<Arc<ProgressCallback>>,
}

impl<F: ForumApi, S: QuestionStore> SyncContext<F, S> {
    /// Create a new builder.
    pub fn builder() -> SyncContextBuilder<F, S> {
        SyncContextBuilder::new()
    }

    pub fn forum(&self) -> &F {
        &self.forum
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn progress(&self) -> Option<&ProgressCallback> {
        self.progress.as_deref()
    }

    /// Run one request, dispatching on its action.
    pub async fn handle(&self, request: SyncRequest) -> std::result::Result<SyncOutcome, SyncError> {
        tracing::debug!(
            action = request.action.as_str(),
            license = ?request.license,
            batch_size = ?request.batch_size,
            "Handling sync request"
        );
        match request.action {
            SyncAction::Sync => self
                .sync(request.license, request.batch_size)
                .await
                .map(SyncOutcome::Sync),
            SyncAction::DryRun => self
                .dry_run(request.license, request.batch_size)
                .await
                .map(SyncOutcome::DryRun),
        }
    }

    /// Create topics for the next batch.
    pub async fn sync(
        &self,
        license: Option<LicenseTier>,
        batch_size: Option<i64>,
    ) -> std::result::Result<SyncResponse, SyncError> {
        run_sync(
            &self.forum,
            &self.store,
            &self.config,
            license,
            batch_size,
            self.progress(),
        )
        .await
    }

    /// Preview the work without writing anything.
    pub async fn dry_run(
        &self,
        license: Option<LicenseTier>,
        batch_size: Option<i64>,
    ) -> std::result::Result<DryRunResponse, SyncError> {
        run_dry_run(
            &self.forum,
            &self.store,
            &self.config,
            license,
            batch_size,
            self.progress(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::testing::{FakeForum, FakeStore, questions};

    type TestContext = SyncContext<FakeForum, FakeStore>;

    #[test]
    fn test_builder_requires_forum() {
        let result = TestContext::builder()
            .store(FakeStore::default())
            .build();
        assert!(matches!(
            result,
            Err(SyncContextError::MissingField { field: "forum" })
        ));
    }

    #[test]
    fn test_builder_requires_store() {
        let result = TestContext::builder()
            .forum(FakeForum::standard())
            .build();
        assert!(matches!(
            result,
            Err(SyncContextError::MissingField { field: "store" })
        ));
    }

    #[test]
    fn test_sync_context_error_display() {
        let err = SyncContextError::MissingField { field: "forum" };
        assert_eq!(err.to_string(), "Missing required field: forum");
    }

    #[test]
    fn test_builder_uses_default_config_when_omitted() {
        let ctx = TestContext::builder()
            .forum(FakeForum::standard())
            .store(FakeStore::default())
            .build()
            .expect("build should succeed");
        assert_eq!(ctx.config(), &SyncConfig::default());
    }

    #[test]
    fn test_builder_preserves_custom_config() {
        let config = SyncConfig {
            max_topic_pages: 7,
            ..SyncConfig::default()
        };
        let ctx = TestContext::builder()
            .forum(FakeForum::standard())
            .store(FakeStore::default())
            .config(config.clone())
            .build()
            .expect("build should succeed");
        assert_eq!(ctx.config(), &config);
    }

    #[tokio::test]
    async fn test_handle_dispatches_on_action() {
        let ctx = TestContext::builder()
            .forum(FakeForum::standard())
            .store(FakeStore::with_questions(questions(&["T1A01", "T1A02"])))
            .build()
            .expect("build should succeed");

        let preview = ctx
            .handle(SyncRequest::parse("dry-run", None, None).expect("valid request"))
            .await
            .expect("dry run");
        assert!(matches!(preview, SyncOutcome::DryRun(_)));
        assert_eq!(ctx.forum().create_calls(), 0);

        let synced = ctx
            .handle(SyncRequest::parse("sync", Some("technician"), Some(1)).expect("valid request"))
            .await
            .expect("sync");
        match synced {
            SyncOutcome::Sync(response) => {
                assert_eq!(response.batch.created, 1);
                assert!(!response.complete);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(ctx.store().synced_count(), 1);
    }

    #[tokio::test]
    async fn test_progress_callback_is_used() {
        let count = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&count);
        let callback: Arc<ProgressCallback> = Arc::new(Box::new(move |_event| {
            sink.fetch_add(1, Ordering::SeqCst);
        }));

        let ctx = TestContext::builder()
            .forum(FakeForum::standard())
            .store(FakeStore::default())
            .progress(callback)
            .build()
            .expect("build should succeed");

        ctx.dry_run(None, None).await.expect("dry run");
        assert!(count.load(Ordering::SeqCst) > 0);
    }
}
