//! Repository for the `payments` table.

use chrono::Utc;
use placement_core::access::{list_scope, Actor, Relation, Resource};
use placement_core::error::CoreError;
use placement_core::notification::{
    ENTITY_PAYMENT, KIND_PAYMENT_RECORDED, KIND_PAYMENT_REVIEWED,
};
use placement_core::pagination::{Page, PageParams};
use placement_core::payment;
use placement_core::status::{OfferStatus, PaymentStatus};
use placement_core::types::DbId;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::notification::NewNotification;
use crate::models::offer::Offer;
use crate::models::payment::{CreatePayment, Payment, PaymentListQuery};
use crate::repositories::base::{BaseRepo, Condition, Entity};
use crate::repositories::NotificationRepo;

/// Owner of the CV placed by the paid offer.
const CV_OWNER_EXPR: &str = "(SELECT c.owner_id FROM offers o JOIN cvs c ON c.id = o.cv_id \
                             WHERE o.id = payments.offer_id)";

const COLUMNS: &str = "id, offer_id, payer_id, amount_cents, currency, method, reference, \
                        status_id, reviewed_by, reviewed_at, created_at, updated_at, \
                        (SELECT c.owner_id FROM offers o JOIN cvs c ON c.id = o.cv_id \
                         WHERE o.id = payments.offer_id) AS cv_owner_id";

impl Entity for Payment {
    const TABLE: &'static str = "payments";
    const COLUMNS: &'static str = COLUMNS;
    const RESOURCE: Resource = Resource::Payment;
    const OWNER_COLUMN: &'static str = "payer_id";

    fn id(&self) -> DbId {
        self.id
    }

    /// Payments the user made, plus payments for workers they manage.
    fn owned_by(user_id: DbId) -> Condition {
        Condition::either(vec![
            Condition::eq("payer_id", user_id),
            Condition::eq(CV_OWNER_EXPR, user_id),
        ])
    }

    fn relation(&self, actor: &Actor) -> Relation {
        if actor.user_id == self.payer_id {
            Relation::Owner
        } else if actor.user_id == self.cv_owner_id {
            Relation::Counterparty
        } else {
            Relation::Stranger
        }
    }
}

/// Manually recorded placement payments and their admin review.
pub struct PaymentRepo;

impl PaymentRepo {
    /// Record a payment against an accepted offer. The payer is the offer's employer.
    pub async fn create(pool: &PgPool, input: &CreatePayment) -> DbResult<Payment> {
        let mut tx = pool.begin().await?;

        let offer = BaseRepo::<Offer>::lock(&mut tx, input.offer_id).await?;
        if offer.status() != OfferStatus::Accepted {
            return Err(CoreError::Conflict(format!(
                "Payments can only be recorded for accepted offers (offer is {})",
                offer.status()
            ))
            .into());
        }

        let query = format!(
            "INSERT INTO payments (offer_id, payer_id, amount_cents, currency, method, reference)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, Payment>(&query)
            .bind(offer.id)
            .bind(offer.employer_id)
            .bind(input.amount_cents)
            .bind(&input.currency)
            .bind(&input.method)
            .bind(&input.reference)
            .fetch_one(&mut *tx)
            .await?;

        NotificationRepo::create_in_tx(
            &mut tx,
            &NewNotification {
                user_id: created.cv_owner_id,
                kind: KIND_PAYMENT_RECORDED,
                title: format!(
                    "Payment of {:.2} {} recorded",
                    created.amount_cents as f64 / 100.0,
                    created.currency
                ),
                body: created.reference.clone(),
                entity_type: ENTITY_PAYMENT,
                entity_id: created.id,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// List payments the actor made or that concern their CVs. Admins see all.
    pub async fn list(
        pool: &PgPool,
        actor: &Actor,
        query: &PaymentListQuery,
    ) -> DbResult<Page<Payment>> {
        let mut conditions = Vec::new();
        if let Some(name) = query.status.as_deref() {
            let status = PaymentStatus::from_name(name).ok_or_else(|| {
                CoreError::Validation(format!("Unknown payment status '{name}'"))
            })?;
            conditions.push(Condition::eq("status_id", status.id()));
        }
        if let Some(offer_id) = query.offer_id {
            conditions.push(Condition::eq("offer_id", offer_id));
        }
        let page = PageParams::new(query.limit, query.offset);
        Ok(BaseRepo::<Payment>::list_scoped(pool, list_scope(actor), conditions, &page).await?)
    }

    /// Confirm or reject a pending payment and notify the payer.
    pub async fn review(
        pool: &PgPool,
        payment_id: DbId,
        reviewer_id: DbId,
        decision: PaymentStatus,
    ) -> DbResult<Payment> {
        if decision == PaymentStatus::Pending {
            return Err(CoreError::Validation("A review must confirm or reject".into()).into());
        }
        let mut tx = pool.begin().await?;

        let current = BaseRepo::<Payment>::lock(&mut tx, payment_id).await?;
        payment::ensure_reviewable(current.status())?;

        let query = format!(
            "UPDATE payments SET status_id = $2, reviewed_by = $3, reviewed_at = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let reviewed = sqlx::query_as::<_, Payment>(&query)
            .bind(payment_id)
            .bind(decision.id())
            .bind(reviewer_id)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        NotificationRepo::create_in_tx(
            &mut tx,
            &NewNotification {
                user_id: reviewed.payer_id,
                kind: KIND_PAYMENT_REVIEWED,
                title: format!("Your payment was {decision}"),
                body: reviewed.reference.clone(),
                entity_type: ENTITY_PAYMENT,
                entity_id: reviewed.id,
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(payment_id, reviewer_id, status = %decision, "Payment reviewed");
        Ok(reviewed)
    }
}
