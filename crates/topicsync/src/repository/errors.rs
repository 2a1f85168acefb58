use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during question store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Question not found.
    #[error("Question not found: {context}")]
    NotFound { context: String },

    /// Invalid input data.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl RepositoryError {
    /// Create a NotFound error for a UUID lookup.
    pub fn not_found_by_id(id: Uuid) -> Self {
        Self::NotFound {
            context: format!("id={}", id),
        }
    }

    /// Whether retrying the same operation could succeed.
    ///
    /// Connection loss, pool exhaustion and statement failures (including
    /// SQLite busy/locked) are transient; missing rows and bad input are not.
    pub fn is_transient(&self) -> bool {
        match self {
            RepositoryError::Database(err) => matches!(
                err,
                DbErr::Conn(_) | DbErr::ConnectionAcquire(_) | DbErr::Exec(_) | DbErr::Query(_)
            ),
            RepositoryError::NotFound { .. } | RepositoryError::InvalidInput { .. } => false,
        }
    }
}

/// Result type alias for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
