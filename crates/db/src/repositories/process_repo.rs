//! Repository for `cv_processes` and `process_step_logs`.

use chrono::Utc;
use placement_core::access::{Actor, Relation, Resource};
use placement_core::error::CoreError;
use placement_core::notification::{ENTITY_PROCESS, KIND_PROCESS_ADVANCED, KIND_PROCESS_REVERTED};
use placement_core::process::{self, StepChange, LOG_ACTION_COMPLETED, LOG_ACTION_REVERTED};
use placement_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::DbResult;
use crate::models::cv::Cv;
use crate::models::notification::NewNotification;
use crate::models::offer::Offer;
use crate::models::process::{CvProcess, ProcessStepLog, ProcessView};
use crate::repositories::base::{BaseRepo, Entity};
use crate::repositories::{CvRepo, NotificationRepo};

/// Owner of the CV a process row belongs to.
const CV_OWNER_EXPR: &str = "(SELECT owner_id FROM cvs WHERE cvs.id = cv_processes.cv_id)";

const COLUMNS: &str = "id, cv_id, offer_id, employer_id, completed_steps, started_at, \
                        completed_at, created_at, updated_at, \
                        (SELECT owner_id FROM cvs WHERE cvs.id = cv_processes.cv_id) AS cv_owner_id";

const LOG_COLUMNS: &str = "id, process_id, step, action, actor_id, note, created_at";

impl Entity for CvProcess {
    const TABLE: &'static str = "cv_processes";
    const COLUMNS: &'static str = COLUMNS;
    const RESOURCE: Resource = Resource::Process;
    const OWNER_COLUMN: &'static str = CV_OWNER_EXPR;

    fn id(&self) -> DbId {
        self.id
    }

    /// The CV owner drives the process; the reserving employer follows it.
    fn relation(&self, actor: &Actor) -> Relation {
        if actor.user_id == self.cv_owner_id {
            Relation::Owner
        } else if actor.user_id == self.employer_id {
            Relation::Counterparty
        } else {
            Relation::Stranger
        }
    }
}

/// Which way a step moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Advance,
    Revert,
}

/// The seven-step placement pipeline.
pub struct ProcessRepo;

impl ProcessRepo {
    /// Open a process at step 0 for a freshly accepted offer.
    pub async fn create_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        offer: &Offer,
    ) -> Result<CvProcess, sqlx::Error> {
        let query = format!(
            "INSERT INTO cv_processes (cv_id, offer_id, employer_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CvProcess>(&query)
            .bind(offer.cv_id)
            .bind(offer.id)
            .bind(offer.employer_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_by_cv(pool: &PgPool, cv_id: DbId) -> Result<Option<CvProcess>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cv_processes WHERE cv_id = $1");
        sqlx::query_as::<_, CvProcess>(&query)
            .bind(cv_id)
            .fetch_optional(pool)
            .await
    }

    /// Process for a CV, or `NotFound` when the CV has never been reserved.
    pub async fn get_by_cv(pool: &PgPool, cv_id: DbId) -> DbResult<CvProcess> {
        Self::find_by_cv(pool, cv_id)
            .await?
            .ok_or_else(|| CoreError::NotFound { entity: "Process", id: cv_id }.into())
    }

    /// Row-lock the process opened by an offer, if any.
    pub async fn lock_by_offer(
        tx: &mut Transaction<'_, Postgres>,
        offer_id: DbId,
    ) -> Result<Option<CvProcess>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cv_processes WHERE offer_id = $1 FOR UPDATE");
        sqlx::query_as::<_, CvProcess>(&query)
            .bind(offer_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Step history, oldest first.
    pub async fn history(
        pool: &PgPool,
        process_id: DbId,
    ) -> Result<Vec<ProcessStepLog>, sqlx::Error> {
        let query = format!(
            "SELECT {LOG_COLUMNS} FROM process_step_logs
             WHERE process_id = $1
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, ProcessStepLog>(&query)
            .bind(process_id)
            .fetch_all(pool)
            .await
    }

    /// Process row plus derived step flags and history.
    pub async fn view(pool: &PgPool, process: CvProcess) -> Result<ProcessView, sqlx::Error> {
        let history = Self::history(pool, process.id).await?;
        Ok(ProcessView {
            summary: process::summarize(process.completed_steps),
            history,
            process,
        })
    }

    /// Complete the next step of the CV's process.
    pub async fn advance(
        pool: &PgPool,
        cv_id: DbId,
        actor_id: DbId,
        note: Option<&str>,
    ) -> DbResult<CvProcess> {
        Self::step(pool, cv_id, actor_id, note, Direction::Advance).await
    }

    /// Undo the most recently completed step.
    pub async fn revert(
        pool: &PgPool,
        cv_id: DbId,
        actor_id: DbId,
        note: Option<&str>,
    ) -> DbResult<CvProcess> {
        Self::step(pool, cv_id, actor_id, note, Direction::Revert).await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn step(
        pool: &PgPool,
        cv_id: DbId,
        actor_id: DbId,
        note: Option<&str>,
        direction: Direction,
    ) -> DbResult<CvProcess> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;

        // CV before process, the same order the offer workflows use.
        let cv = BaseRepo::<Cv>::lock(&mut tx, cv_id).await?;
        let query = format!("SELECT {COLUMNS} FROM cv_processes WHERE cv_id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, CvProcess>(&query)
            .bind(cv_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound { entity: "Process", id: cv_id })?;

        let change: StepChange = match direction {
            Direction::Advance => process::plan_advance(current.completed_steps)?,
            Direction::Revert => process::plan_revert(current.completed_steps)?,
        };

        if let Some(status) = change.cv_status {
            CvRepo::set_status_in_tx(&mut tx, &cv, status).await?;
        }

        let update = format!(
            "UPDATE cv_processes SET
                completed_steps = $2,
                started_at = COALESCE(started_at, $3),
                completed_at = CASE WHEN $2 >= $4 THEN $3 ELSE NULL END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, CvProcess>(&update)
            .bind(current.id)
            .bind(change.completed_after)
            .bind(now)
            .bind(process::TOTAL_STEPS)
            .fetch_one(&mut *tx)
            .await?;

        let (action, kind, verb) = match direction {
            Direction::Advance => (LOG_ACTION_COMPLETED, KIND_PROCESS_ADVANCED, "completed"),
            Direction::Revert => (LOG_ACTION_REVERTED, KIND_PROCESS_REVERTED, "reverted"),
        };
        sqlx::query(
            "INSERT INTO process_step_logs (process_id, step, action, actor_id, note)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(updated.id)
        .bind(change.step.name())
        .bind(action)
        .bind(actor_id)
        .bind(note)
        .execute(&mut *tx)
        .await?;

        let title = format!(
            "Step '{}' {verb} ({}%)",
            change.step.name(),
            process::progress_percent(updated.completed_steps)
        );
        let mut recipients = vec![updated.employer_id];
        if direction == Direction::Revert && updated.cv_owner_id != actor_id {
            recipients.push(updated.cv_owner_id);
        }
        let notes: Vec<NewNotification> = recipients
            .into_iter()
            .map(|user_id| NewNotification {
                user_id,
                kind,
                title: title.clone(),
                body: note.map(str::to_string),
                entity_type: ENTITY_PROCESS,
                entity_id: updated.id,
            })
            .collect();
        NotificationRepo::create_many_in_tx(&mut tx, &notes).await?;

        tx.commit().await?;

        tracing::info!(
            process_id = updated.id,
            cv_id,
            step = change.step.name(),
            action,
            completed_steps = updated.completed_steps,
            "Process step changed"
        );
        Ok(updated)
    }
}
