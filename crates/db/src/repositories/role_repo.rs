//! Mapping between the typed [`Role`] and rows of the seeded `roles` table.

use placement_core::error::CoreError;
use placement_core::roles::Role;
use placement_core::types::DbId;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::role::RoleRecord;

pub struct RoleRepo;

impl RoleRepo {
    /// Database id for `role`. A missing seed row is an internal error.
    pub async fn id_of(pool: &PgPool, role: Role) -> DbResult<DbId> {
        let id: Option<DbId> = sqlx::query_scalar("SELECT id FROM roles WHERE name = $1")
            .bind(role.as_str())
            .fetch_optional(pool)
            .await?;
        id.ok_or_else(|| CoreError::Internal(format!("Role '{role}' is not seeded")).into())
    }

    /// Every role, lowest id first.
    pub async fn list(pool: &PgPool) -> Result<Vec<RoleRecord>, sqlx::Error> {
        sqlx::query_as::<_, RoleRecord>("SELECT id, name, description FROM roles ORDER BY id")
            .fetch_all(pool)
            .await
    }
}
