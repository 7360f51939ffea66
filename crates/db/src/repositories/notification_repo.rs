//! Repository for the `notifications` table.

use placement_core::pagination::{Page, PageParams};
use placement_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::notification::{NewNotification, Notification};

const COLUMNS: &str =
    "id, user_id, kind, title, body, entity_type, entity_id, is_read, read_at, created_at";

/// Per-user notification inbox.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a notification inside the caller's transaction, so it commits
    /// or rolls back with the change that triggered it.
    pub async fn create_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        input: &NewNotification,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notifications (user_id, kind, title, body, entity_type, entity_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(input.user_id)
        .bind(input.kind)
        .bind(&input.title)
        .bind(&input.body)
        .bind(input.entity_type)
        .bind(input.entity_id)
        .fetch_one(&mut **tx)
        .await
    }

    /// Insert several notifications in one transaction.
    pub async fn create_many_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        inputs: &[NewNotification],
    ) -> Result<(), sqlx::Error> {
        for input in inputs {
            Self::create_in_tx(tx, input).await?;
        }
        Ok(())
    }

    /// List a user's notifications, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
        page: &PageParams,
    ) -> Result<Page<Notification>, sqlx::Error> {
        let filter = if unread_only {
            "AND is_read = false"
        } else {
            ""
        };
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 {filter}"
        ))
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 {filter} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        let items = sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Mark one of the user's notifications as read.
    ///
    /// Returns `None` when the notification does not exist or belongs to
    /// someone else. Already-read notifications are returned unchanged.
    pub async fn mark_read(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!(
            "UPDATE notifications \
             SET is_read = true, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(notification_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Mark every unread notification of a user as read. Returns the count updated.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true, read_at = NOW() \
             WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
