//! Common re-exports for convenient entity usage.

pub use super::question::{
    ActiveModel as QuestionActiveModel, Column as QuestionColumn, Entity as QuestionEntity,
    Model as QuestionModel,
};
pub use super::sync_status::DiscourseSyncStatus;
