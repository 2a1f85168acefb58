//! SeaORM entity definitions for the question bank schema.

pub mod prelude;
pub mod question;
pub mod sync_status;
