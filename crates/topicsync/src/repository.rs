//! Question store operations.
//!
//! Reads page through the `questions` table in display-name order; writes
//! touch only the forum sync columns and the explanation.

mod errors;
mod query;
mod single;
mod store;

pub use errors::{RepositoryError, Result};
pub use query::{Pagination, count, find_by_topic_id, find_page};
pub use single::{mark_error, mark_synced, update_explanation};
pub use store::QuestionStore;

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, RuntimeErr};
    use serde_json::json;
    use uuid::Uuid;

    use crate::entity::question::Model;
    use crate::entity::sync_status::DiscourseSyncStatus;
    use crate::question::LicenseTier;

    fn model(display_name: &str, forum_url: Option<&str>) -> Model {
        Model {
            id: Uuid::new_v4(),
            display_name: display_name.to_string(),
            question: format!("Question {display_name}?"),
            options: json!(["a", "b", "c", "d"]),
            correct_answer: 1,
            explanation: None,
            forum_url: forum_url.map(str::to_string),
            discourse_sync_status: DiscourseSyncStatus::Unsynced,
            discourse_sync_at: None,
            discourse_sync_error: None,
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn logged_sql(db: sea_orm::DatabaseConnection) -> String {
        format!("{:?}", db.into_transaction_log())
    }

    #[test]
    fn test_repository_error_not_found_by_id() {
        let id = Uuid::new_v4();
        let err = RepositoryError::not_found_by_id(id);
        let msg = err.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains(&id.to_string()));
    }

    #[test]
    fn test_repository_error_invalid_input() {
        let err = RepositoryError::InvalidInput {
            message: "Missing required field".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Invalid input"));
        assert!(msg.contains("Missing required field"));
    }

    #[test]
    fn test_transient_classification() {
        let conn = RepositoryError::from(DbErr::Conn(RuntimeErr::Internal(
            "connection reset".to_string(),
        )));
        assert!(conn.is_transient());

        let busy = RepositoryError::from(DbErr::Exec(RuntimeErr::Internal(
            "database is locked".to_string(),
        )));
        assert!(busy.is_transient());

        let missing = RepositoryError::from(DbErr::RecordNotFound("gone".to_string()));
        assert!(!missing.is_transient());
        assert!(!RepositoryError::not_found_by_id(Uuid::new_v4()).is_transient());
    }

    #[test]
    fn test_pagination_offset() {
        assert_eq!(Pagination::new(0, 1000).offset(), 0);
        assert_eq!(Pagination::new(3, 1000).offset(), 3000);
        assert_eq!(Pagination::new(2, 0).per_page, 1);
    }

    #[tokio::test]
    async fn test_find_page_filters_by_tier_and_orders() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![model("G1A01", None), model("G1A02", None)]])
            .into_connection();

        let rows = find_page(&db, Some(LicenseTier::General), Pagination::new(1, 2))
            .await
            .expect("mock query should succeed");
        assert_eq!(rows.len(), 2);

        let sql = logged_sql(db);
        assert!(sql.contains("LIKE"), "expected prefix filter: {sql}");
        assert!(sql.contains("G%"), "expected tier letter: {sql}");
        assert!(sql.contains("ORDER BY"), "expected ordering: {sql}");
        assert!(sql.contains("OFFSET"), "expected offset: {sql}");
    }

    #[tokio::test]
    async fn test_find_page_without_tier_has_no_filter() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![model("E1A01", None)]])
            .into_connection();

        find_page(&db, None, Pagination::new(0, 1000))
            .await
            .expect("mock query should succeed");

        let sql = logged_sql(db);
        assert!(!sql.contains("LIKE"), "unexpected filter: {sql}");
    }

    #[tokio::test]
    async fn test_store_fetch_page_converts_models() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![model("T1A01", None)]])
            .into_connection();

        let questions = db
            .fetch_page(Some(LicenseTier::Technician), Pagination::new(0, 1000))
            .await
            .expect("mock query should succeed");

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].display_name, "T1A01");
        assert_eq!(questions[0].options, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_find_by_topic_id_matches_url_suffix() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![model(
                "T1A01",
                Some("https://forum.test/t/t1a01-question/42"),
            )]])
            .into_connection();

        let found = db
            .find_by_topic_id(42)
            .await
            .expect("mock query should succeed")
            .expect("question should be found");
        assert_eq!(found.display_name, "T1A01");

        let sql = logged_sql(db);
        assert!(sql.contains("%/42"), "expected suffix match: {sql}");
    }

    #[tokio::test]
    async fn test_mark_synced_updates_row() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([exec(1)])
            .into_connection();

        mark_synced(&db, Uuid::new_v4(), "https://forum.test/t/t1a01/1")
            .await
            .expect("update should succeed");

        let sql = logged_sql(db);
        assert!(sql.contains("forum_url"));
        assert!(sql.contains("synced"));
        assert!(sql.contains("discourse_sync_error"));
    }

    #[tokio::test]
    async fn test_mark_synced_missing_row_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([exec(0)])
            .into_connection();

        let err = mark_synced(&db, Uuid::new_v4(), "https://forum.test/t/t1a01/1")
            .await
            .expect_err("no row updated");
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_mark_synced_rejects_empty_url() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let err = mark_synced(&db, Uuid::new_v4(), "")
            .await
            .expect_err("empty url is invalid");
        assert!(matches!(err, RepositoryError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_mark_error_truncates_message() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([exec(1)])
            .into_connection();

        mark_error(&db, Uuid::new_v4(), &"x".repeat(5000))
            .await
            .expect("update should succeed");

        let sql = logged_sql(db);
        assert!(sql.contains(&"x".repeat(1000)));
        assert!(!sql.contains(&"x".repeat(1001)));
    }

    #[tokio::test]
    async fn test_update_explanation() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([exec(1)])
            .into_connection();

        db.update_explanation(Uuid::new_v4(), "New explanation")
            .await
            .expect("update should succeed");

        let sql = logged_sql(db);
        assert!(sql.contains("explanation"));
        assert!(sql.contains("New explanation"));
    }
}
