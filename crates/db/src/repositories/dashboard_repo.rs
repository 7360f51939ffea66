//! Aggregate counters for `GET /dashboard`.

use placement_core::access::{list_scope, Actor, ListScope};
use placement_core::status::{OfferStatus, TransferStatus};
use placement_core::types::DbId;
use sqlx::PgPool;

use crate::models::dashboard::{DashboardStats, StatusCount};
use crate::repositories::NotificationRepo;

/// Read-only dashboard queries.
pub struct DashboardRepo;

impl DashboardRepo {
    /// Counters for the actor's scope. Admin counters cover the whole platform.
    ///
    /// Every query takes a nullable `$1` user id; `NULL` disables the scope.
    pub async fn stats(pool: &PgPool, actor: &Actor) -> Result<DashboardStats, sqlx::Error> {
        let scope: Option<DbId> = match list_scope(actor) {
            ListScope::All => None,
            ListScope::Owned(user_id) => Some(user_id),
        };

        let cvs_by_status = sqlx::query_as::<_, StatusCount>(
            "SELECT s.name AS status, COUNT(c.id) AS count
             FROM cv_statuses s
             LEFT JOIN cvs c ON c.status_id = s.id
                 AND c.deleted_at IS NULL
                 AND ($1::BIGINT IS NULL OR c.owner_id = $1)
             GROUP BY s.id, s.name
             ORDER BY s.id",
        )
        .bind(scope)
        .fetch_all(pool)
        .await?;
        let total_cvs = cvs_by_status.iter().map(|s| s.count).sum();

        let pending_offers_made: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM offers
             WHERE status_id = $2 AND ($1::BIGINT IS NULL OR employer_id = $1)",
        )
        .bind(scope)
        .bind(OfferStatus::Pending.id())
        .fetch_one(pool)
        .await?;

        let pending_offers_received: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM offers o JOIN cvs c ON c.id = o.cv_id
             WHERE o.status_id = $2 AND ($1::BIGINT IS NULL OR c.owner_id = $1)",
        )
        .bind(scope)
        .bind(OfferStatus::Pending.id())
        .fetch_one(pool)
        .await?;

        let pending_transfers_received: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transfers
             WHERE status_id = $2 AND ($1::BIGINT IS NULL OR to_user_id = $1)",
        )
        .bind(scope)
        .bind(TransferStatus::Pending.id())
        .fetch_one(pool)
        .await?;

        let active_processes: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cv_processes p JOIN cvs c ON c.id = p.cv_id
             WHERE p.completed_at IS NULL
               AND ($1::BIGINT IS NULL OR c.owner_id = $1 OR p.employer_id = $1)",
        )
        .bind(scope)
        .fetch_one(pool)
        .await?;

        let unread_notifications = NotificationRepo::unread_count(pool, actor.user_id).await?;

        Ok(DashboardStats {
            cvs_by_status,
            total_cvs,
            pending_offers_made,
            pending_offers_received,
            pending_transfers_received,
            active_processes,
            unread_notifications,
        })
    }
}
