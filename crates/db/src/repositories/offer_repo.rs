//! Repository for the `offers` table and the reservation workflow.

use chrono::Utc;
use placement_core::access::{list_scope, Actor, Relation, Resource};
use placement_core::error::CoreError;
use placement_core::notification::{
    ENTITY_OFFER, KIND_OFFER_ACCEPTED, KIND_OFFER_CANCELLED, KIND_OFFER_RECEIVED,
    KIND_OFFER_REJECTED,
};
use placement_core::offer;
use placement_core::pagination::{Page, PageParams};
use placement_core::status::{CvStatus, JobStatus, OfferStatus};
use placement_core::types::{DbId, Timestamp};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::DbResult;
use crate::models::cv::Cv;
use crate::models::job::Job;
use crate::models::notification::NewNotification;
use crate::models::offer::{CreateOffer, Offer, OfferListQuery};
use crate::models::process::CvProcess;
use crate::repositories::base::{BaseRepo, Condition, Entity};
use crate::repositories::{CvRepo, NotificationRepo, ProcessRepo};

const COLUMNS: &str = "id, cv_id, employer_id, job_id, salary, message, status_id, \
                        response_note, expires_at, responded_at, created_at, updated_at, \
                        (SELECT owner_id FROM cvs WHERE cvs.id = offers.cv_id) AS cv_owner_id";

/// Note written on competing offers when a CV gets reserved.
const RESERVED_ELSEWHERE_NOTE: &str = "CV was reserved by another employer";

impl Entity for Offer {
    const TABLE: &'static str = "offers";
    const COLUMNS: &'static str = COLUMNS;
    const RESOURCE: Resource = Resource::Offer;
    const OWNER_COLUMN: &'static str = "employer_id";

    fn id(&self) -> DbId {
        self.id
    }

    /// Offers the user made, plus offers on CVs they manage.
    fn owned_by(user_id: DbId) -> Condition {
        Condition::either(vec![
            Condition::eq("employer_id", user_id),
            Condition::cv_owned_by("cv_id", user_id),
        ])
    }

    fn relation(&self, actor: &Actor) -> Relation {
        if actor.user_id == self.employer_id {
            Relation::Owner
        } else if actor.user_id == self.cv_owner_id {
            Relation::Counterparty
        } else {
            Relation::Stranger
        }
    }
}

/// Offers and the reserve / reject / cancel workflow around them.
pub struct OfferRepo;

impl OfferRepo {
    /// Record an offer from `employer_id` and notify the CV owner.
    pub async fn create(
        pool: &PgPool,
        employer_id: DbId,
        input: &CreateOffer,
        expires_at: Timestamp,
    ) -> DbResult<Offer> {
        let mut tx = pool.begin().await?;

        let cv = BaseRepo::<Cv>::lock(&mut tx, input.cv_id).await?;
        if cv.owner_id == employer_id {
            return Err(CoreError::Validation("Cannot make an offer on your own CV".into()).into());
        }
        if cv.status() != CvStatus::Available {
            return Err(CoreError::Conflict(format!(
                "CV is {} and cannot receive offers",
                cv.status()
            ))
            .into());
        }

        if let Some(job_id) = input.job_id {
            let job = BaseRepo::<Job>::find_by_id(pool, job_id)
                .await?
                .ok_or(CoreError::NotFound { entity: "Job", id: job_id })?;
            if job.owner_id != employer_id {
                return Err(CoreError::Validation(
                    "Offers can only reference your own job postings".into(),
                )
                .into());
            }
            if job.status() != JobStatus::Open {
                return Err(CoreError::Conflict("Job is closed".into()).into());
            }
        }

        let query = format!(
            "INSERT INTO offers (cv_id, employer_id, job_id, salary, message, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, Offer>(&query)
            .bind(input.cv_id)
            .bind(employer_id)
            .bind(input.job_id)
            .bind(input.salary)
            .bind(&input.message)
            .bind(expires_at)
            .fetch_one(&mut *tx)
            .await?;

        NotificationRepo::create_in_tx(
            &mut tx,
            &NewNotification {
                user_id: cv.owner_id,
                kind: KIND_OFFER_RECEIVED,
                title: format!("New offer for {}", cv.full_name),
                body: created.message.clone(),
                entity_type: ENTITY_OFFER,
                entity_id: created.id,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// List offers the actor made or received. Admins see all offers.
    pub async fn list(
        pool: &PgPool,
        actor: &Actor,
        query: &OfferListQuery,
    ) -> DbResult<Page<Offer>> {
        let mut conditions = Vec::new();
        if let Some(name) = query.status.as_deref() {
            let status = OfferStatus::from_name(name)
                .ok_or_else(|| CoreError::Validation(format!("Unknown offer status '{name}'")))?;
            conditions.push(Condition::eq("status_id", status.id()));
        }
        if let Some(cv_id) = query.cv_id {
            conditions.push(Condition::eq("cv_id", cv_id));
        }
        let page = PageParams::new(query.limit, query.offset);
        Ok(BaseRepo::<Offer>::list_scoped(pool, list_scope(actor), conditions, &page).await?)
    }

    /// Accept an offer: reserve the CV, reject competing offers, open the process.
    ///
    /// An offer found past its expiry is marked expired (committed) and the
    /// call fails with `Conflict`.
    pub async fn accept(pool: &PgPool, offer_id: DbId) -> DbResult<(Offer, CvProcess)> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;

        let (cv, current) = CvRepo::lock_with::<Offer>(&mut tx, offer_id).await?;
        if Self::expire_if_due(&mut tx, &current, now).await? {
            tx.commit().await?;
            return Err(CoreError::Conflict("Offer has expired".into()).into());
        }
        offer::ensure_respondable(current.status())?;

        CvRepo::set_status_in_tx(&mut tx, &cv, CvStatus::Reserved).await?;

        let accepted = Self::set_status(&mut tx, offer_id, OfferStatus::Accepted, None, now).await?;

        let losers: Vec<(DbId, DbId)> = sqlx::query_as(
            "UPDATE offers SET status_id = $3, response_note = $4, responded_at = $5
             WHERE cv_id = $1 AND id <> $2 AND status_id = $6
             RETURNING id, employer_id",
        )
        .bind(cv.id)
        .bind(offer_id)
        .bind(OfferStatus::Rejected.id())
        .bind(RESERVED_ELSEWHERE_NOTE)
        .bind(now)
        .bind(OfferStatus::Pending.id())
        .fetch_all(&mut *tx)
        .await?;

        let process = ProcessRepo::create_in_tx(&mut tx, &accepted).await?;

        let mut notes = vec![NewNotification {
            user_id: accepted.employer_id,
            kind: KIND_OFFER_ACCEPTED,
            title: format!("Your offer for {} was accepted", cv.full_name),
            body: None,
            entity_type: ENTITY_OFFER,
            entity_id: accepted.id,
        }];
        notes.extend(losers.iter().map(|&(id, employer_id)| NewNotification {
            user_id: employer_id,
            kind: KIND_OFFER_REJECTED,
            title: format!("Your offer for {} was declined", cv.full_name),
            body: Some(RESERVED_ELSEWHERE_NOTE.to_string()),
            entity_type: ENTITY_OFFER,
            entity_id: id,
        }));
        NotificationRepo::create_many_in_tx(&mut tx, &notes).await?;

        tx.commit().await?;

        tracing::info!(
            offer_id,
            cv_id = cv.id,
            rejected = losers.len(),
            "Offer accepted, CV reserved"
        );
        Ok((accepted, process))
    }

    /// Reject a pending offer and notify the employer.
    pub async fn reject(pool: &PgPool, offer_id: DbId, note: Option<&str>) -> DbResult<Offer> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;

        let (_cv, current) = CvRepo::lock_with::<Offer>(&mut tx, offer_id).await?;
        if Self::expire_if_due(&mut tx, &current, now).await? {
            tx.commit().await?;
            return Err(CoreError::Conflict("Offer has expired".into()).into());
        }
        offer::ensure_respondable(current.status())?;

        let rejected = Self::set_status(&mut tx, offer_id, OfferStatus::Rejected, note, now).await?;
        NotificationRepo::create_in_tx(
            &mut tx,
            &NewNotification {
                user_id: rejected.employer_id,
                kind: KIND_OFFER_REJECTED,
                title: "Your offer was declined".into(),
                body: note.map(str::to_string),
                entity_type: ENTITY_OFFER,
                entity_id: rejected.id,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(rejected)
    }

    /// Withdraw an offer.
    ///
    /// Pending offers are simply cancelled. An accepted offer can be
    /// cancelled while its process has no completed steps: the process row
    /// is removed and the CV returns to `available`.
    pub async fn cancel(pool: &PgPool, offer_id: DbId) -> DbResult<Offer> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;

        let (cv, current) = CvRepo::lock_with::<Offer>(&mut tx, offer_id).await?;
        if current.status() == OfferStatus::Accepted {
            let process = ProcessRepo::lock_by_offer(&mut tx, offer_id).await?;
            let completed = process.as_ref().map_or(0, |p| p.completed_steps);
            offer::ensure_cancellable(current.status(), completed)?;

            if let Some(process) = process {
                sqlx::query("DELETE FROM cv_processes WHERE id = $1")
                    .bind(process.id)
                    .execute(&mut *tx)
                    .await?;
            }
            CvRepo::set_status_in_tx(&mut tx, &cv, CvStatus::Available).await?;
        } else {
            offer::ensure_cancellable(current.status(), 0)?;
        }

        let cancelled =
            Self::set_status(&mut tx, offer_id, OfferStatus::Cancelled, None, now).await?;
        NotificationRepo::create_in_tx(
            &mut tx,
            &NewNotification {
                user_id: cancelled.cv_owner_id,
                kind: KIND_OFFER_CANCELLED,
                title: "An offer on your CV was withdrawn".into(),
                body: None,
                entity_type: ENTITY_OFFER,
                entity_id: cancelled.id,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(cancelled)
    }

    /// Cancel every pending offer on a CV. Returns `(offer id, employer id)`
    /// pairs so the caller can notify the employers.
    pub async fn cancel_pending_for_cv(
        tx: &mut Transaction<'_, Postgres>,
        cv_id: DbId,
    ) -> Result<Vec<(DbId, DbId)>, sqlx::Error> {
        sqlx::query_as(
            "UPDATE offers SET status_id = $2, responded_at = NOW()
             WHERE cv_id = $1 AND status_id = $3
             RETURNING id, employer_id",
        )
        .bind(cv_id)
        .bind(OfferStatus::Cancelled.id())
        .bind(OfferStatus::Pending.id())
        .fetch_all(&mut **tx)
        .await
    }

    /// Mark every pending offer past its expiry as expired. Returns the count.
    pub async fn expire_stale(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE offers SET status_id = $1 WHERE status_id = $2 AND expires_at <= NOW()",
        )
        .bind(OfferStatus::Expired.id())
        .bind(OfferStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn set_status(
        tx: &mut Transaction<'_, Postgres>,
        offer_id: DbId,
        status: OfferStatus,
        note: Option<&str>,
        now: Timestamp,
    ) -> Result<Offer, sqlx::Error> {
        let query = format!(
            "UPDATE offers SET status_id = $2, response_note = COALESCE($3, response_note), \
                               responded_at = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(offer_id)
            .bind(status.id())
            .bind(note)
            .bind(now)
            .fetch_one(&mut **tx)
            .await
    }

    /// Mark `offer` expired if it is pending and past due. Returns whether it did.
    async fn expire_if_due(
        tx: &mut Transaction<'_, Postgres>,
        offer: &Offer,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        if !offer::is_expired(offer.status(), offer.expires_at, now) {
            return Ok(false);
        }
        sqlx::query("UPDATE offers SET status_id = $2 WHERE id = $1")
            .bind(offer.id)
            .bind(OfferStatus::Expired.id())
            .execute(&mut **tx)
            .await?;
        tracing::info!(offer_id = offer.id, "Offer expired on response");
        Ok(true)
    }
}
