//! Repository for the `jobs` table.

use placement_core::access::{Actor, ListScope, Relation, Resource};
use placement_core::error::CoreError;
use placement_core::pagination::{Page, PageParams};
use placement_core::status::JobStatus;
use placement_core::types::DbId;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::job::{CreateJob, Job, JobListQuery, UpdateJob};
use crate::repositories::base::{BaseRepo, Condition, Entity};

const COLUMNS: &str = "id, owner_id, title, description, country, city, salary_min, salary_max, \
                        currency, positions, status_id, deleted_at, created_at, updated_at";

/// Currency stored when a posting does not name one.
pub const DEFAULT_CURRENCY: &str = "SAR";

impl Entity for Job {
    const TABLE: &'static str = "jobs";
    const COLUMNS: &'static str = COLUMNS;
    const RESOURCE: Resource = Resource::Job;
    const OWNER_COLUMN: &'static str = "owner_id";
    const SOFT_DELETE: bool = true;

    fn id(&self) -> DbId {
        self.id
    }

    fn relation(&self, actor: &Actor) -> Relation {
        match actor.relation_to(self.owner_id) {
            Relation::Owner => Relation::Owner,
            _ => Relation::Public,
        }
    }
}

/// Job board postings.
pub struct JobRepo;

impl JobRepo {
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateJob,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (owner_id, title, description, country, city, salary_min, salary_max, \
                               currency, positions)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(owner_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.country)
            .bind(&input.city)
            .bind(input.salary_min)
            .bind(input.salary_max)
            .bind(input.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))
            .bind(input.positions.unwrap_or(1))
            .fetch_one(pool)
            .await
    }

    /// Update a job. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateJob,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                country = COALESCE($4, country),
                city = COALESCE($5, city),
                salary_min = COALESCE($6, salary_min),
                salary_max = COALESCE($7, salary_max),
                currency = COALESCE($8, currency),
                positions = COALESCE($9, positions)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.country)
            .bind(&input.city)
            .bind(input.salary_min)
            .bind(input.salary_max)
            .bind(&input.currency)
            .bind(input.positions)
            .fetch_optional(pool)
            .await
    }

    /// Close an open posting.
    pub async fn close(pool: &PgPool, job: &Job) -> DbResult<Job> {
        if job.status() == JobStatus::Closed {
            return Err(CoreError::Conflict("Job is already closed".into()).into());
        }
        let query = format!(
            "UPDATE jobs SET status_id = $2
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Job>(&query)
            .bind(job.id)
            .bind(JobStatus::Closed.id())
            .fetch_one(pool)
            .await?)
    }

    /// List postings. Every role may browse the board; `owner_only`
    /// narrows it to the caller's own postings.
    pub async fn list(pool: &PgPool, actor: &Actor, query: &JobListQuery) -> DbResult<Page<Job>> {
        let scope = if query.owner_only {
            ListScope::Owned(actor.user_id)
        } else {
            ListScope::All
        };
        let mut conditions = Vec::new();
        if let Some(name) = query.status.as_deref() {
            let status = JobStatus::from_name(name)
                .ok_or_else(|| CoreError::Validation(format!("Unknown job status '{name}'")))?;
            conditions.push(Condition::eq("status_id", status.id()));
        }
        if let Some(country) = query.country.as_deref() {
            conditions.push(Condition::contains("country", country));
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            conditions.push(Condition::either(vec![
                Condition::contains("title", search.trim()),
                Condition::contains("description", search.trim()),
            ]));
        }
        let page = PageParams::new(query.limit, query.offset);
        Ok(BaseRepo::<Job>::list_scoped(pool, scope, conditions, &page).await?)
    }
}
