//! Forum sync state recorded on each question row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Where a question stands with respect to its forum topic.
///
/// A forum write that succeeded but could not be recorded is reported as
/// `partial` in the sync response and has no variant here:
/// the row stays `Unsynced` and the next run's forum scan links it.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum DiscourseSyncStatus {
    #[sea_orm(string_value = "unsynced")]
    #[default]
    Unsynced,
    #[sea_orm(string_value = "synced")]
    Synced,
    #[sea_orm(string_value = "error")]
    Error,
}

impl std::fmt::Display for DiscourseSyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscourseSyncStatus::Unsynced => write!(f, "unsynced"),
            DiscourseSyncStatus::Synced => write!(f, "synced"),
            DiscourseSyncStatus::Error => write!(f, "error"),
        }
    }
}
