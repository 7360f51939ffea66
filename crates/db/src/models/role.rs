//! Seeded account roles.

use placement_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `roles` table, as listed on admin screens.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RoleRecord {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
}
