//! Create the `questions` table with its forum sync columns.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Questions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Questions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Questions::DisplayName)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    // Content
                    .col(ColumnDef::new(Questions::Question).text().not_null())
                    .col(
                        ColumnDef::new(Questions::Options)
                            .json()
                            .not_null()
                            .default(Expr::cust("'[]'")),
                    )
                    .col(
                        ColumnDef::new(Questions::CorrectAnswer)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Questions::Explanation).text().null())
                    // Forum sync
                    .col(ColumnDef::new(Questions::ForumUrl).string().null())
                    .col(
                        ColumnDef::new(Questions::DiscourseSyncStatus)
                            .string()
                            .not_null()
                            .default("unsynced"),
                    )
                    .col(
                        ColumnDef::new(Questions::DiscourseSyncAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Questions::DiscourseSyncError).text().null())
                    .to_owned(),
            )
            .await?;

        // Webhook lookups match on the trailing topic id of forum_url.
        manager
            .create_index(
                Index::create()
                    .name("idx_questions_forum_url")
                    .table(Questions::Table)
                    .col(Questions::ForumUrl)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_questions_sync_status")
                    .table(Questions::Table)
                    .col(Questions::DiscourseSyncStatus)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Questions::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    Id,
    DisplayName,
    Question,
    Options,
    CorrectAnswer,
    Explanation,
    ForumUrl,
    DiscourseSyncStatus,
    DiscourseSyncAt,
    DiscourseSyncError,
}
