//! Question entity - one exam question from the license question pools.
//!
//! `display_name` (e.g. `T1A01`) is the pool identifier and the only key
//! shared with the forum. The `discourse_sync_*` columns are written by the
//! sync engine and never read back to decide what to create.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::sync_status::DiscourseSyncStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Pool identifier: tier letter, subelement digit, group letter, two digits.
    #[sea_orm(unique)]
    pub display_name: String,

    #[sea_orm(column_type = "Text")]
    pub question: String,

    /// Answer options as a JSON array of strings (four in every pool).
    pub options: Json,

    /// Zero-based index into `options`.
    pub correct_answer: i32,

    #[sea_orm(column_type = "Text", nullable)]
    pub explanation: Option<String>,

    pub forum_url: Option<String>,

    pub discourse_sync_status: DiscourseSyncStatus,

    pub discourse_sync_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(column_type = "Text", nullable)]
    pub discourse_sync_error: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
