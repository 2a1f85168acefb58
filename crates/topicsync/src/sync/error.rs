//! Fatal sync errors.
//!
//! Anything that stops a whole run lives here. Failures of a single question
//! are values in the response details, never an `Err`.

use thiserror::Error;

use crate::forum::ForumError;
use crate::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum SyncError {
    /// One or more tier categories do not exist on the forum.
    #[error("Missing forum categories: {}", .missing.join(", "))]
    MissingCategories { missing: Vec<String> },

    #[error("Invalid action '{0}': expected 'sync' or 'dry-run'")]
    InvalidAction(String),

    #[error("Invalid license '{0}': expected 'technician', 'general' or 'extra'")]
    InvalidLicense(String),

    /// Category listing, topic scan or other required forum read failed.
    #[error("Forum error: {0}")]
    Forum(#[from] ForumError),

    /// Reading questions failed.
    #[error("Database error: {0}")]
    Store(#[from] RepositoryError),
}

impl SyncError {
    /// HTTP status for this error when served over HTTP.
    pub fn status_code(&self) -> u16 {
        match self {
            SyncError::MissingCategories { .. }
            | SyncError::InvalidAction(_)
            | SyncError::InvalidLicense(_) => 400,
            SyncError::Forum(_) => 502,
            SyncError::Store(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_categories_lists_every_name() {
        let err = SyncError::MissingCategories {
            missing: vec!["General Questions".to_string(), "Extra Questions".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing forum categories: General Questions, Extra Questions"
        );
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn status_codes() {
        assert_eq!(SyncError::InvalidAction("x".into()).status_code(), 400);
        assert_eq!(SyncError::InvalidLicense("x".into()).status_code(), 400);
        assert_eq!(
            SyncError::Forum(ForumError::Config("x".into())).status_code(),
            502
        );
        assert_eq!(
            SyncError::Store(RepositoryError::InvalidInput {
                message: "x".into()
            })
            .status_code(),
            500
        );
    }
}
