//! Repository for the `transfers` table and the ownership hand-over workflow.

use chrono::Utc;
use placement_core::access::{list_scope, Actor, Relation, Resource};
use placement_core::error::CoreError;
use placement_core::notification::{
    ENTITY_OFFER, ENTITY_TRANSFER, KIND_OFFER_CANCELLED, KIND_TRANSFER_ACCEPTED,
    KIND_TRANSFER_CANCELLED, KIND_TRANSFER_REJECTED, KIND_TRANSFER_REQUESTED,
};
use placement_core::pagination::{Page, PageParams};
use placement_core::roles::Role;
use placement_core::status::TransferStatus;
use placement_core::transfer;
use placement_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::DbResult;
use crate::models::cv::Cv;
use crate::models::notification::NewNotification;
use crate::models::transfer::{CreateTransfer, Transfer, TransferListQuery};
use crate::repositories::base::{BaseRepo, Condition, Entity};
use crate::repositories::{CvRepo, NotificationRepo, OfferRepo};

const COLUMNS: &str = "id, cv_id, from_user_id, to_user_id, note, status_id, responded_at, \
                        created_at, updated_at";

/// Role name and active flag of a transfer's target user.
const TARGET_USER_QUERY: &str = "SELECT r.name, u.is_active FROM users u \
                                 JOIN roles r ON r.id = u.role_id WHERE u.id = $1";

impl Entity for Transfer {
    const TABLE: &'static str = "transfers";
    const COLUMNS: &'static str = COLUMNS;
    const RESOURCE: Resource = Resource::Transfer;
    const OWNER_COLUMN: &'static str = "from_user_id";

    fn id(&self) -> DbId {
        self.id
    }

    /// Transfers the user requested or was offered.
    fn owned_by(user_id: DbId) -> Condition {
        Condition::either(vec![
            Condition::eq("from_user_id", user_id),
            Condition::eq("to_user_id", user_id),
        ])
    }

    fn relation(&self, actor: &Actor) -> Relation {
        if actor.user_id == self.from_user_id {
            Relation::Owner
        } else if actor.user_id == self.to_user_id {
            Relation::Counterparty
        } else {
            Relation::Stranger
        }
    }
}

/// Transfers of CV management between agent / recruitment accounts.
pub struct TransferRepo;

impl TransferRepo {
    /// Request a transfer of `input.cv_id` from its current owner.
    pub async fn create(pool: &PgPool, input: &CreateTransfer) -> DbResult<Transfer> {
        let mut tx = pool.begin().await?;

        let cv = BaseRepo::<Cv>::lock(&mut tx, input.cv_id).await?;

        let target: Option<(String, bool)> = sqlx::query_as(TARGET_USER_QUERY)
        .bind(input.to_user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (role_name, is_active) = target.ok_or(CoreError::NotFound {
            entity: "User",
            id: input.to_user_id,
        })?;
        let to_role = Role::parse(&role_name)?;

        transfer::validate_request(cv.owner_id, input.to_user_id, to_role, is_active, cv.status())?;

        let query = format!(
            "INSERT INTO transfers (cv_id, from_user_id, to_user_id, note)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, Transfer>(&query)
            .bind(cv.id)
            .bind(cv.owner_id)
            .bind(input.to_user_id)
            .bind(&input.note)
            .fetch_one(&mut *tx)
            .await?;

        NotificationRepo::create_in_tx(
            &mut tx,
            &NewNotification {
                user_id: created.to_user_id,
                kind: KIND_TRANSFER_REQUESTED,
                title: format!("Transfer request for {}", cv.full_name),
                body: created.note.clone(),
                entity_type: ENTITY_TRANSFER,
                entity_id: created.id,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// List transfers the actor requested or received. Admins see all.
    pub async fn list(
        pool: &PgPool,
        actor: &Actor,
        query: &TransferListQuery,
    ) -> DbResult<Page<Transfer>> {
        let mut conditions = Vec::new();
        if let Some(name) = query.status.as_deref() {
            let status = TransferStatus::from_name(name).ok_or_else(|| {
                CoreError::Validation(format!("Unknown transfer status '{name}'"))
            })?;
            conditions.push(Condition::eq("status_id", status.id()));
        }
        let page = PageParams::new(query.limit, query.offset);
        Ok(BaseRepo::<Transfer>::list_scoped(pool, list_scope(actor), conditions, &page).await?)
    }

    /// Accept a transfer: the target becomes the CV owner and pending offers
    /// on the CV are cancelled.
    pub async fn accept(pool: &PgPool, transfer_id: DbId) -> DbResult<Transfer> {
        let mut tx = pool.begin().await?;

        let (cv, current) = CvRepo::lock_with::<Transfer>(&mut tx, transfer_id).await?;
        transfer::ensure_pending(current.status())?;

        if cv.owner_id != current.from_user_id {
            return Err(
                CoreError::Conflict("CV owner changed since the request was made".into()).into(),
            );
        }
        // Re-check the CV state; it may have been reserved since the request.
        let target: (String, bool) = sqlx::query_as(TARGET_USER_QUERY)
        .bind(current.to_user_id)
        .fetch_one(&mut *tx)
        .await?;
        transfer::validate_request(
            cv.owner_id,
            current.to_user_id,
            Role::parse(&target.0)?,
            target.1,
            cv.status(),
        )?;

        sqlx::query("UPDATE cvs SET owner_id = $2 WHERE id = $1")
            .bind(cv.id)
            .bind(current.to_user_id)
            .execute(&mut *tx)
            .await?;

        let cancelled_offers = OfferRepo::cancel_pending_for_cv(&mut tx, cv.id).await?;

        let accepted = Self::set_status(&mut tx, transfer_id, TransferStatus::Accepted).await?;

        let mut notes = vec![NewNotification {
            user_id: accepted.from_user_id,
            kind: KIND_TRANSFER_ACCEPTED,
            title: format!("Transfer of {} was accepted", cv.full_name),
            body: None,
            entity_type: ENTITY_TRANSFER,
            entity_id: accepted.id,
        }];
        notes.extend(cancelled_offers.iter().map(|&(id, employer_id)| NewNotification {
            user_id: employer_id,
            kind: KIND_OFFER_CANCELLED,
            title: format!("Your offer for {} was cancelled after a transfer", cv.full_name),
            body: None,
            entity_type: ENTITY_OFFER,
            entity_id: id,
        }));
        NotificationRepo::create_many_in_tx(&mut tx, &notes).await?;

        tx.commit().await?;

        tracing::info!(
            transfer_id,
            cv_id = cv.id,
            from_user_id = accepted.from_user_id,
            to_user_id = accepted.to_user_id,
            cancelled_offers = cancelled_offers.len(),
            "Transfer accepted, CV ownership changed"
        );
        Ok(accepted)
    }

    /// Decline a pending transfer; the requester is notified.
    pub async fn reject(pool: &PgPool, transfer_id: DbId) -> DbResult<Transfer> {
        Self::close(pool, transfer_id, TransferStatus::Rejected).await
    }

    /// Withdraw a pending transfer; the target is notified.
    pub async fn cancel(pool: &PgPool, transfer_id: DbId) -> DbResult<Transfer> {
        Self::close(pool, transfer_id, TransferStatus::Cancelled).await
    }

    /// Cancel the pending transfer on a CV, if any. Returns `(transfer id,
    /// target user id)` pairs so the caller can notify the targets.
    pub async fn cancel_pending_for_cv(
        tx: &mut Transaction<'_, Postgres>,
        cv_id: DbId,
    ) -> Result<Vec<(DbId, DbId)>, sqlx::Error> {
        sqlx::query_as(
            "UPDATE transfers SET status_id = $2, responded_at = NOW()
             WHERE cv_id = $1 AND status_id = $3
             RETURNING id, to_user_id",
        )
        .bind(cv_id)
        .bind(TransferStatus::Cancelled.id())
        .bind(TransferStatus::Pending.id())
        .fetch_all(&mut **tx)
        .await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn close(pool: &PgPool, transfer_id: DbId, status: TransferStatus) -> DbResult<Transfer> {
        let mut tx = pool.begin().await?;

        let current = BaseRepo::<Transfer>::lock(&mut tx, transfer_id).await?;
        transfer::ensure_pending(current.status())?;

        let closed = Self::set_status(&mut tx, transfer_id, status).await?;
        let (user_id, kind, title) = match status {
            TransferStatus::Rejected => (
                closed.from_user_id,
                KIND_TRANSFER_REJECTED,
                "Your transfer request was declined",
            ),
            _ => (
                closed.to_user_id,
                KIND_TRANSFER_CANCELLED,
                "A transfer request was withdrawn",
            ),
        };
        NotificationRepo::create_in_tx(
            &mut tx,
            &NewNotification {
                user_id,
                kind,
                title: title.into(),
                body: None,
                entity_type: ENTITY_TRANSFER,
                entity_id: closed.id,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(closed)
    }

    async fn set_status(
        tx: &mut Transaction<'_, Postgres>,
        transfer_id: DbId,
        status: TransferStatus,
    ) -> Result<Transfer, sqlx::Error> {
        let query = format!(
            "UPDATE transfers SET status_id = $2, responded_at = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Transfer>(&query)
            .bind(transfer_id)
            .bind(status.id())
            .bind(Utc::now())
            .fetch_one(&mut **tx)
            .await
    }
}
