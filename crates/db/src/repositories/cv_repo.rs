//! Repository for the `cvs` table.

use chrono::NaiveDate;
use placement_core::access::{
    authorize, list_scope, Action, Actor, ListScope, Relation, Resource,
};
use placement_core::cv;
use placement_core::error::CoreError;
use placement_core::notification::{
    ENTITY_OFFER, ENTITY_TRANSFER, KIND_OFFER_CANCELLED, KIND_TRANSFER_CANCELLED,
};
use placement_core::pagination::{Page, PageParams};
use placement_core::roles::Role;
use placement_core::status::{CvStatus, OfferStatus};
use placement_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::DbResult;
use crate::models::cv::{CreateCv, Cv, CvListQuery, UpdateCv};
use crate::models::notification::NewNotification;
use crate::repositories::base::{BaseRepo, Condition, Entity};
use crate::repositories::{NotificationRepo, OfferRepo, TransferRepo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, owner_id, created_by, full_name, passport_number, nationality, \
                        gender, date_of_birth, marital_status, religion, profession, \
                        experience_years, languages, expected_salary, summary, photo_url, \
                        passport_url, video_url, status_id, deleted_at, created_at, updated_at";

impl Entity for Cv {
    const TABLE: &'static str = "cvs";
    const COLUMNS: &'static str = COLUMNS;
    const RESOURCE: Resource = Resource::Cv;
    const OWNER_COLUMN: &'static str = "owner_id";
    const SOFT_DELETE: bool = true;

    fn id(&self) -> DbId {
        self.id
    }

    /// Available CVs are public to browsing employers. Employer involvement
    /// through offers is resolved by [`CvRepo::relation_for`].
    fn relation(&self, actor: &Actor) -> Relation {
        match actor.relation_to(self.owner_id) {
            Relation::Owner => Relation::Owner,
            _ if self.status() == CvStatus::Available => Relation::Public,
            other => other,
        }
    }
}

/// Worker profiles plus the status changes that are not part of a larger workflow.
pub struct CvRepo;

impl CvRepo {
    /// Insert a CV owned by `owner_id`. `input` must already be validated and normalized.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateCv,
    ) -> Result<Cv, sqlx::Error> {
        let query = format!(
            "INSERT INTO cvs (owner_id, created_by, full_name, passport_number, nationality, \
                              gender, date_of_birth, marital_status, religion, profession, \
                              experience_years, languages, expected_salary, summary, \
                              photo_url, passport_url, video_url)
             VALUES ($1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cv>(&query)
            .bind(owner_id)
            .bind(&input.full_name)
            .bind(&input.passport_number)
            .bind(&input.nationality)
            .bind(&input.gender)
            .bind(input.date_of_birth)
            .bind(&input.marital_status)
            .bind(&input.religion)
            .bind(&input.profession)
            .bind(input.experience_years)
            .bind(&input.languages)
            .bind(input.expected_salary)
            .bind(&input.summary)
            .bind(&input.photo_url)
            .bind(&input.passport_url)
            .bind(&input.video_url)
            .fetch_one(pool)
            .await
    }

    /// Update a CV. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCv,
    ) -> Result<Option<Cv>, sqlx::Error> {
        let query = format!(
            "UPDATE cvs SET
                full_name = COALESCE($2, full_name),
                passport_number = COALESCE($3, passport_number),
                nationality = COALESCE($4, nationality),
                gender = COALESCE($5, gender),
                date_of_birth = COALESCE($6, date_of_birth),
                marital_status = COALESCE($7, marital_status),
                religion = COALESCE($8, religion),
                profession = COALESCE($9, profession),
                experience_years = COALESCE($10, experience_years),
                languages = COALESCE($11, languages),
                expected_salary = COALESCE($12, expected_salary),
                summary = COALESCE($13, summary),
                photo_url = COALESCE($14, photo_url),
                passport_url = COALESCE($15, passport_url),
                video_url = COALESCE($16, video_url)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cv>(&query)
            .bind(id)
            .bind(&input.full_name)
            .bind(&input.passport_number)
            .bind(&input.nationality)
            .bind(&input.gender)
            .bind(input.date_of_birth)
            .bind(&input.marital_status)
            .bind(&input.religion)
            .bind(&input.profession)
            .bind(input.experience_years)
            .bind(&input.languages)
            .bind(input.expected_salary)
            .bind(&input.summary)
            .bind(&input.photo_url)
            .bind(&input.passport_url)
            .bind(&input.video_url)
            .fetch_optional(pool)
            .await
    }

    /// Whether another live CV already carries this passport number.
    pub async fn passport_taken(
        pool: &PgPool,
        passport_number: &str,
        except_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let mut conditions = vec![Condition::eq("passport_number", passport_number)];
        if let Some(id) = except_id {
            conditions.push(Condition::ne("id", id));
        }
        BaseRepo::<Cv>::exists(pool, &conditions).await
    }

    /// Resolve how `actor` relates to `cv`, including employers holding an
    /// offer or a process on it.
    pub async fn relation_for(
        pool: &PgPool,
        actor: &Actor,
        cv: &Cv,
    ) -> Result<Relation, sqlx::Error> {
        let base = cv.relation(actor);
        if base == Relation::Owner || !actor.role.is_employer() {
            return Ok(base);
        }
        let involved: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM offers
                            WHERE cv_id = $1 AND employer_id = $2 AND status_id = ANY($3))
                 OR EXISTS (SELECT 1 FROM cv_processes WHERE cv_id = $1 AND employer_id = $2)",
        )
        .bind(cv.id)
        .bind(actor.user_id)
        .bind(vec![OfferStatus::Pending.id(), OfferStatus::Accepted.id()])
        .fetch_one(pool)
        .await?;
        Ok(if involved { Relation::Counterparty } else { base })
    }

    /// Load a CV and check that `actor` may perform `action` on it.
    pub async fn find_authorized(
        pool: &PgPool,
        actor: &Actor,
        action: Action,
        id: DbId,
    ) -> DbResult<Cv> {
        let cv = BaseRepo::<Cv>::get(pool, id).await?;
        let relation = Self::relation_for(pool, actor, &cv).await?;
        authorize(actor, Resource::Cv, action, relation)?;
        Ok(cv)
    }

    /// List CVs visible to `actor`, filtered by `query`.
    ///
    /// Admins see everything. Agents see their own CVs, sponsors browse
    /// available ones, and recruitment companies see both.
    pub async fn list(
        pool: &PgPool,
        actor: &Actor,
        query: &CvListQuery,
        today: NaiveDate,
    ) -> DbResult<Page<Cv>> {
        let mut conditions = Vec::new();
        if let ListScope::Owned(user_id) = list_scope(actor) {
            let available = Condition::eq("status_id", CvStatus::Available.id());
            conditions.push(match actor.role {
                Role::Sponsor => available,
                Role::Recruitment => Condition::either(vec![
                    Condition::eq("owner_id", user_id),
                    available,
                ]),
                _ => Condition::eq("owner_id", user_id),
            });
        }

        if let Some(name) = query.status.as_deref() {
            let status = CvStatus::from_name(name)
                .ok_or_else(|| CoreError::Validation(format!("Unknown CV status '{name}'")))?;
            conditions.push(Condition::eq("status_id", status.id()));
        }
        if let Some(nationality) = query.nationality.as_deref() {
            conditions.push(Condition::contains("nationality", nationality));
        }
        if let Some(gender) = query.gender.as_deref() {
            cv::validate_gender(gender)?;
            conditions.push(Condition::eq("gender", gender));
        }
        if let Some(profession) = query.profession.as_deref() {
            conditions.push(Condition::contains("profession", profession));
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            conditions.push(Condition::contains("full_name", search.trim()));
        }
        cv::validate_age_filter(query.min_age, query.max_age)?;
        if let Some(min_age) = query.min_age {
            conditions.push(Condition::lte(
                "date_of_birth",
                cv::born_on_or_before(min_age, today)?,
            ));
        }
        if let Some(max_age) = query.max_age {
            conditions.push(Condition::gt("date_of_birth", cv::born_after(max_age, today)?));
        }

        let page = PageParams::new(query.limit, query.offset);
        Ok(BaseRepo::<Cv>::list(pool, &conditions, &page).await?)
    }

    /// Move a CV between statuses outside a workflow (withdraw / publish).
    ///
    /// The update is guarded on the current status so a concurrent
    /// reservation wins cleanly.
    pub async fn change_status(pool: &PgPool, cv: &Cv, to: CvStatus) -> DbResult<Cv> {
        cv::ensure_transition(cv.status(), to)?;
        let query = format!(
            "UPDATE cvs SET status_id = $3
             WHERE id = $1 AND status_id = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cv>(&query)
            .bind(cv.id)
            .bind(cv.status_id)
            .bind(to.id())
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| {
                CoreError::Conflict("CV status changed concurrently, reload and retry".into())
                    .into()
            })
    }

    /// Set a CV's status inside a workflow transaction, checking the transition.
    pub async fn set_status_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        cv: &Cv,
        to: CvStatus,
    ) -> DbResult<()> {
        cv::ensure_transition(cv.status(), to)?;
        sqlx::query("UPDATE cvs SET status_id = $2 WHERE id = $1")
            .bind(cv.id)
            .bind(to.id())
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Row-lock a CV-scoped row (offer or transfer) together with its CV.
    ///
    /// The CV is locked first. Every workflow takes row locks in the order
    /// cvs, then offers / transfers, then cv_processes.
    pub async fn lock_with<T: Entity>(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> DbResult<(Cv, T)> {
        let cv_id: DbId =
            sqlx::query_scalar(&format!("SELECT cv_id FROM {} WHERE id = $1", T::TABLE))
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: T::RESOURCE.entity_name(),
                    id,
                })?;
        let cv = BaseRepo::<Cv>::lock(tx, cv_id).await?;
        let row = BaseRepo::<T>::lock(tx, id).await?;
        Ok((cv, row))
    }

    /// Soft-delete a CV unless it is reserved or further along.
    ///
    /// The status is checked under the row lock. Pending offers and any
    /// pending transfer on the CV are cancelled and their counterparties
    /// notified.
    pub async fn delete(pool: &PgPool, cv_id: DbId) -> DbResult<()> {
        let mut tx = pool.begin().await?;

        let cv = BaseRepo::<Cv>::lock(&mut tx, cv_id).await?;
        if cv::is_locked(cv.status()) {
            return Err(CoreError::Conflict(format!(
                "CV is {} and cannot be deleted",
                cv.status()
            ))
            .into());
        }

        sqlx::query("UPDATE cvs SET deleted_at = NOW() WHERE id = $1")
            .bind(cv.id)
            .execute(&mut *tx)
            .await?;

        let offers = OfferRepo::cancel_pending_for_cv(&mut tx, cv.id).await?;
        let transfers = TransferRepo::cancel_pending_for_cv(&mut tx, cv.id).await?;

        let mut notes: Vec<NewNotification> = offers
            .iter()
            .map(|&(id, employer_id)| NewNotification {
                user_id: employer_id,
                kind: KIND_OFFER_CANCELLED,
                title: format!("{} was removed; your offer was cancelled", cv.full_name),
                body: None,
                entity_type: ENTITY_OFFER,
                entity_id: id,
            })
            .collect();
        notes.extend(transfers.iter().map(|&(id, to_user_id)| NewNotification {
            user_id: to_user_id,
            kind: KIND_TRANSFER_CANCELLED,
            title: format!("{} was removed; the transfer request was withdrawn", cv.full_name),
            body: None,
            entity_type: ENTITY_TRANSFER,
            entity_id: id,
        }));
        NotificationRepo::create_many_in_tx(&mut tx, &notes).await?;

        tx.commit().await?;

        tracing::info!(
            cv_id,
            cancelled_offers = offers.len(),
            cancelled_transfers = transfers.len(),
            "CV deleted"
        );
        Ok(())
    }
}
