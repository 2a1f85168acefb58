//! Topicsync - keeps an exam question bank and its Discourse forum in step.
//!
//! The library reconciles the `questions` table with forum topics: one topic
//! per question, created in small resumable batches. Nothing about sync
//! progress is stored server-side; every run re-scans the forum to decide
//! what is left to do.
//!
//! # Features
//!
//! - `discourse` - Enables the reqwest-backed HTTP transport used by
//!   [`forum::ForumClient::new`].
//! - `migrate` - Enables database migration support via [`connect_and_migrate`].
//! - `sqlite` / `postgres` - Database drivers.
//!
//! # Example
//!
//! ```ignore
//! use topicsync::forum::ForumClient;
//! use topicsync::sync::{SyncContext, SyncRequest};
//!
//! let db = topicsync::connect_and_migrate("sqlite://questions.db?mode=rwc").await?;
//! let forum = ForumClient::new("https://forum.example.com", api_key, "system", None)?;
//!
//! let ctx = SyncContext::builder().forum(forum).store(db).build()?;
//! let response = ctx.handle(SyncRequest::parse("dry-run", None, None)?).await?;
//! ```

pub mod db;
pub mod entity;
pub mod forum;
pub mod http;
pub mod question;
pub mod repository;
pub mod retry;
pub mod sync;
pub mod topic;
pub mod webhook;

#[cfg(feature = "migrate")]
pub mod migration;

#[cfg(test)]
pub(crate) mod testing;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use forum::{ApiRateLimiter, ForumApi, ForumClient, ForumError};
pub use question::{LicenseTier, Question};
pub use repository::{QuestionStore, RepositoryError};
