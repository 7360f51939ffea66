//! Handlers for the `/jobs` resource (employer job postings).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use placement_core::access::{authorize_create, Action, Resource};
use placement_core::error::CoreError;
use placement_core::job;
use placement_core::pagination::Page;
use placement_core::types::DbId;
use placement_db::models::job::{CreateJob, Job, JobListQuery, UpdateJob};
use placement_db::repositories::{BaseRepo, JobRepo};
use validator::Validate;

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/jobs
///
/// Post a job. Sponsors and recruitment companies only. Returns 201.
pub async fn create_job(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Json(mut input): Json<CreateJob>,
) -> AppResult<Response> {
    authorize_create(&ctx.actor, Resource::Job)?;
    input.validate()?;
    input.title = input.title.trim().to_string();
    if let Some(currency) = input.currency.as_deref() {
        job::validate_currency(currency)?;
    }
    job::validate_salary_range(input.salary_min, input.salary_max)?;

    let created = JobRepo::create(&state.pool, ctx.user_id(), &input).await?;
    tracing::info!(job_id = created.id, owner_id = created.owner_id, "Job posted");

    ctx.set_response(StatusCode::CREATED, "Job posted");
    Ok(ctx.respond(created))
}

/// GET /api/v1/jobs
///
/// The job board. `?owner_only=true` narrows it to the caller's postings.
pub async fn list_jobs(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> AppResult<Json<DataResponse<Page<Job>>>> {
    let page = JobRepo::list(&state.pool, &auth.actor(), &query).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Job>>> {
    let job = BaseRepo::<Job>::find_authorized(&state.pool, &auth.actor(), Action::Read, id).await?;
    Ok(Json(DataResponse { data: job }))
}

/// PUT /api/v1/jobs/{id}
///
/// The salary range is checked against the merged result, so updating one
/// bound cannot leave `salary_min > salary_max`.
pub async fn update_job(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateJob>,
) -> AppResult<Response> {
    let existing =
        BaseRepo::<Job>::find_authorized(&state.pool, &ctx.actor, Action::Update, id).await?;
    input.validate()?;
    if let Some(title) = input.title.as_mut() {
        *title = title.trim().to_string();
    }
    if let Some(currency) = input.currency.as_deref() {
        job::validate_currency(currency)?;
    }
    job::validate_salary_range(
        input.salary_min.or(existing.salary_min),
        input.salary_max.or(existing.salary_max),
    )?;

    let updated = JobRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Job", id }))?;
    tracing::info!(job_id = id, user_id = ctx.user_id(), "Job updated");

    ctx.set_response(StatusCode::OK, "Job updated");
    Ok(ctx.respond(updated))
}

/// POST /api/v1/jobs/{id}/close
///
/// Stop accepting offers against this posting. 409 if already closed.
pub async fn close_job(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let job = BaseRepo::<Job>::find_authorized(&state.pool, &ctx.actor, Action::Update, id).await?;
    let closed = JobRepo::close(&state.pool, &job).await?;
    tracing::info!(job_id = id, user_id = ctx.user_id(), "Job closed");

    ctx.set_response(StatusCode::OK, "Job closed");
    Ok(ctx.respond(closed))
}

/// DELETE /api/v1/jobs/{id}
///
/// Soft delete. Offers that referenced the job keep their history.
pub async fn delete_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    BaseRepo::<Job>::find_authorized(&state.pool, &auth.actor(), Action::Delete, id).await?;
    if !BaseRepo::<Job>::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Job", id }));
    }
    tracing::info!(job_id = id, user_id = auth.user_id, "Job deleted");
    Ok(StatusCode::NO_CONTENT)
}
