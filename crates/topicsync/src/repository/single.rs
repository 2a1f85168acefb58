use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entity::question::{Column, Entity as QuestionEntity};
use crate::entity::sync_status::DiscourseSyncStatus;

use super::errors::{RepositoryError, Result};

// ─── Single Record Updates ───────────────────────────────────────────────────

/// Longest error message stored on a row.
const MAX_SYNC_ERROR_LENGTH: usize = 1000;

async fn update_one(
    db: &DatabaseConnection,
    id: Uuid,
    update: sea_orm::UpdateMany<QuestionEntity>,
) -> Result<()> {
    let result = update.filter(Column::Id.eq(id)).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(RepositoryError::not_found_by_id(id));
    }
    Ok(())
}

/// Record that a question is linked to its forum topic.
///
/// Sets `forum_url`, marks the row synced with the current time and clears
/// any previous sync error.
pub async fn mark_synced(db: &DatabaseConnection, id: Uuid, forum_url: &str) -> Result<()> {
    if forum_url.is_empty() {
        return Err(RepositoryError::InvalidInput {
            message: "forum_url must not be empty".to_string(),
        });
    }

    let update = QuestionEntity::update_many()
        .col_expr(Column::ForumUrl, Expr::value(forum_url))
        .col_expr(
            Column::DiscourseSyncStatus,
            Expr::value(DiscourseSyncStatus::Synced.to_string()),
        )
        .col_expr(Column::DiscourseSyncAt, Expr::value(Utc::now().fixed_offset()))
        .col_expr(Column::DiscourseSyncError, Expr::value(Option::<String>::None));

    update_one(db, id, update).await
}

/// Record a failed sync attempt for a question.
pub async fn mark_error(db: &DatabaseConnection, id: Uuid, message: &str) -> Result<()> {
    let message: String = message.chars().take(MAX_SYNC_ERROR_LENGTH).collect();

    let update = QuestionEntity::update_many()
        .col_expr(
            Column::DiscourseSyncStatus,
            Expr::value(DiscourseSyncStatus::Error.to_string()),
        )
        .col_expr(Column::DiscourseSyncAt, Expr::value(Utc::now().fixed_offset()))
        .col_expr(Column::DiscourseSyncError, Expr::value(message));

    update_one(db, id, update).await
}

/// Replace a question's explanation.
pub async fn update_explanation(db: &DatabaseConnection, id: Uuid, explanation: &str) -> Result<()> {
    let update =
        QuestionEntity::update_many().col_expr(Column::Explanation, Expr::value(explanation));

    update_one(db, id, update).await
}
