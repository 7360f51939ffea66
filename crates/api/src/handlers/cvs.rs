//! Handlers for the `/cvs` resource: worker profiles, MRZ prefill and the
//! placement process nested under each CV.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use chrono::{NaiveDate, Utc};
use placement_core::access::{authorize, authorize_create, Action, Resource};
use placement_core::cv;
use placement_core::error::CoreError;
use placement_core::mrz::{self, MrzData};
use placement_core::pagination::Page;
use placement_core::status::CvStatus;
use placement_core::types::DbId;
use placement_db::models::cv::{CreateCv, Cv, CvListQuery, UpdateCv};
use placement_db::models::offer::RespondNote;
use placement_db::models::process::ProcessView;
use placement_db::repositories::{CvRepo, Entity, ProcessRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireWorkerManager;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /cvs/mrz`.
#[derive(Debug, Deserialize, Validate)]
pub struct MrzRequest {
    /// The two MRZ lines, newline separated.
    #[validate(length(min = 88, max = 200))]
    pub text: String,
}

/// CV prefill derived from a passport MRZ.
#[derive(Debug, Serialize)]
pub struct MrzPrefill {
    pub full_name: String,
    pub passport_number: String,
    pub nationality: String,
    pub date_of_birth: NaiveDate,
    pub gender: Option<String>,
    pub passport_expiry: NaiveDate,
    pub passport_expired: bool,
    /// Another live CV already uses this passport number.
    pub already_registered: bool,
    pub mrz: MrzData,
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/cvs
///
/// Register a worker profile owned by the caller. Returns 201.
pub async fn create_cv(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Json(mut input): Json<CreateCv>,
) -> AppResult<Response> {
    authorize_create(&ctx.actor, Resource::Cv)?;
    input.validate()?;

    input.full_name = input.full_name.trim().to_string();
    input.passport_number = cv::normalize_passport_number(&input.passport_number);
    validate_new_cv(&input, today())?;

    if CvRepo::passport_taken(&state.pool, &input.passport_number, None).await? {
        return Err(duplicate_passport(&input.passport_number));
    }

    let created = CvRepo::create(&state.pool, ctx.user_id(), &input).await?;
    tracing::info!(cv_id = created.id, owner_id = created.owner_id, "CV created");

    ctx.set_response(StatusCode::CREATED, "CV created");
    Ok(ctx.respond(created))
}

/// GET /api/v1/cvs
///
/// CVs visible to the caller, filtered and paginated.
pub async fn list_cvs(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<CvListQuery>,
) -> AppResult<Json<DataResponse<Page<Cv>>>> {
    query.validate()?;
    let page = CvRepo::list(&state.pool, &auth.actor(), &query, today()).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/cvs/{id}
pub async fn get_cv(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Cv>>> {
    let cv = CvRepo::find_authorized(&state.pool, &auth.actor(), Action::Read, id).await?;
    Ok(Json(DataResponse { data: cv }))
}

/// PUT /api/v1/cvs/{id}
///
/// Partial update by the owner. A changed passport number is normalized and
/// re-checked for duplicates.
pub async fn update_cv(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateCv>,
) -> AppResult<Response> {
    let existing = CvRepo::find_authorized(&state.pool, &ctx.actor, Action::Update, id).await?;
    input.validate()?;

    if let Some(name) = input.full_name.as_mut() {
        *name = name.trim().to_string();
    }
    if let Some(passport) = input.passport_number.as_mut() {
        *passport = cv::normalize_passport_number(passport);
    }
    validate_cv_update(&input, today())?;

    if let Some(passport) = input.passport_number.as_deref() {
        if passport != existing.passport_number
            && CvRepo::passport_taken(&state.pool, passport, Some(id)).await?
        {
            return Err(duplicate_passport(passport));
        }
    }

    let updated = CvRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "CV", id }))?;
    tracing::info!(cv_id = id, user_id = ctx.user_id(), "CV updated");

    ctx.set_response(StatusCode::OK, "CV updated");
    Ok(ctx.respond(updated))
}

/// DELETE /api/v1/cvs/{id}
///
/// Soft delete. Refused with 409 while the CV is reserved or further along;
/// pending offers and transfers on it are cancelled.
pub async fn delete_cv(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    CvRepo::find_authorized(&state.pool, &auth.actor(), Action::Delete, id).await?;
    CvRepo::delete(&state.pool, id).await?;
    tracing::info!(cv_id = id, user_id = auth.user_id, "CV deleted by owner");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// POST /api/v1/cvs/{id}/withdraw
///
/// Take an available CV off the market.
pub async fn withdraw_cv(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    change_status(ctx, &state, id, CvStatus::Withdrawn, "CV withdrawn").await
}

/// POST /api/v1/cvs/{id}/publish
///
/// Put a withdrawn CV back on the market.
pub async fn publish_cv(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    change_status(ctx, &state, id, CvStatus::Available, "CV published").await
}

async fn change_status(
    mut ctx: RequestContext,
    state: &AppState,
    id: DbId,
    to: CvStatus,
    message: &str,
) -> AppResult<Response> {
    let cv = CvRepo::find_authorized(&state.pool, &ctx.actor, Action::Update, id).await?;
    let updated = CvRepo::change_status(&state.pool, &cv, to).await?;
    tracing::info!(cv_id = id, from = %cv.status(), to = %to, "CV status changed");

    ctx.set_response(StatusCode::OK, message);
    Ok(ctx.respond(updated))
}

// ---------------------------------------------------------------------------
// MRZ
// ---------------------------------------------------------------------------

/// POST /api/v1/cvs/mrz
///
/// Parse passport MRZ text into a CV prefill. Nothing is stored.
pub async fn parse_mrz(
    RequireWorkerManager(_manager): RequireWorkerManager,
    State(state): State<AppState>,
    Json(input): Json<MrzRequest>,
) -> AppResult<Json<DataResponse<MrzPrefill>>> {
    input.validate()?;

    let today = today();
    let data = mrz::parse_td3(&input.text, today)?;
    let already_registered =
        CvRepo::passport_taken(&state.pool, &data.passport_number, None).await?;

    let prefill = MrzPrefill {
        full_name: data.full_name(),
        passport_number: data.passport_number.clone(),
        nationality: data.nationality.clone(),
        date_of_birth: data.date_of_birth,
        gender: data.gender.clone(),
        passport_expiry: data.expiry_date,
        passport_expired: data.expiry_date < today,
        already_registered,
        mrz: data,
    };
    Ok(Json(DataResponse { data: prefill }))
}

// ---------------------------------------------------------------------------
// Process
// ---------------------------------------------------------------------------

/// GET /api/v1/cvs/{id}/process
///
/// Step flags, progress and history for the CV's placement process.
pub async fn get_process(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(cv_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProcessView>>> {
    let actor = auth.actor();
    let process = ProcessRepo::get_by_cv(&state.pool, cv_id).await?;
    authorize(&actor, Resource::Process, Action::Read, process.relation(&actor))?;

    let view = ProcessRepo::view(&state.pool, process).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/cvs/{id}/process/advance
///
/// Complete the next step. Only the CV owner (or an admin) drives the process.
pub async fn advance_process(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Path(cv_id): Path<DbId>,
    body: Option<Json<RespondNote>>,
) -> AppResult<Response> {
    let note = note_from(body)?;
    let process = ProcessRepo::get_by_cv(&state.pool, cv_id).await?;
    authorize(&ctx.actor, Resource::Process, Action::Update, process.relation(&ctx.actor))?;

    let updated = ProcessRepo::advance(&state.pool, cv_id, ctx.user_id(), note.as_deref()).await?;
    let view = ProcessRepo::view(&state.pool, updated).await?;

    let message = match view.summary.current_step {
        Some(next) => format!("Step completed; next step is {}", next.name()),
        None => "Process complete; worker deployed".to_string(),
    };
    ctx.set_response(StatusCode::OK, message);
    Ok(ctx.respond(view))
}

/// POST /api/v1/cvs/{id}/process/revert
///
/// Undo the last completed step. Admin only.
pub async fn revert_process(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Path(cv_id): Path<DbId>,
    body: Option<Json<RespondNote>>,
) -> AppResult<Response> {
    let note = note_from(body)?;
    let process = ProcessRepo::get_by_cv(&state.pool, cv_id).await?;
    authorize(&ctx.actor, Resource::Process, Action::Delete, process.relation(&ctx.actor))?;

    let updated = ProcessRepo::revert(&state.pool, cv_id, ctx.user_id(), note.as_deref()).await?;
    let view = ProcessRepo::view(&state.pool, updated).await?;

    ctx.set_response(StatusCode::OK, "Step reverted");
    Ok(ctx.respond(view))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn duplicate_passport(passport: &str) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "A CV with passport number {passport} already exists"
    )))
}

/// Optional `{ "note": ... }` body shared by step and response endpoints.
pub(crate) fn note_from(body: Option<Json<RespondNote>>) -> AppResult<Option<String>> {
    let Some(Json(body)) = body else {
        return Ok(None);
    };
    body.validate()?;
    Ok(body.note.filter(|n| !n.trim().is_empty()))
}

fn validate_new_cv(input: &CreateCv, today: NaiveDate) -> Result<(), CoreError> {
    if input.full_name.is_empty() {
        return Err(CoreError::Validation("full_name cannot be empty".into()));
    }
    cv::validate_passport_number(&input.passport_number)?;
    cv::validate_gender(&input.gender)?;
    if let Some(status) = input.marital_status.as_deref() {
        cv::validate_marital_status(status)?;
    }
    cv::validate_experience(input.experience_years)?;
    cv::validate_age(input.date_of_birth, today)
}

fn validate_cv_update(input: &UpdateCv, today: NaiveDate) -> Result<(), CoreError> {
    if input.full_name.as_deref().is_some_and(str::is_empty) {
        return Err(CoreError::Validation("full_name cannot be empty".into()));
    }
    if let Some(passport) = input.passport_number.as_deref() {
        cv::validate_passport_number(passport)?;
    }
    if let Some(gender) = input.gender.as_deref() {
        cv::validate_gender(gender)?;
    }
    if let Some(status) = input.marital_status.as_deref() {
        cv::validate_marital_status(status)?;
    }
    if let Some(years) = input.experience_years {
        cv::validate_experience(years)?;
    }
    if let Some(dob) = input.date_of_birth {
        cv::validate_age(dob, today)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn sample() -> CreateCv {
        CreateCv {
            full_name: "Amina Yusuf".into(),
            passport_number: "AB1234567".into(),
            nationality: "Kenya".into(),
            gender: "female".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1995, 4, 2).unwrap(),
            marital_status: Some("single".into()),
            religion: None,
            profession: "Housekeeper".into(),
            experience_years: 4,
            languages: vec!["English".into(), "Swahili".into()],
            expected_salary: Some(1500),
            summary: None,
            photo_url: None,
            passport_url: None,
            video_url: None,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    #[test]
    fn valid_cv_passes() {
        assert!(validate_new_cv(&sample(), day()).is_ok());
    }

    #[test]
    fn underage_worker_rejected() {
        let mut input = sample();
        input.date_of_birth = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        assert_matches!(validate_new_cv(&input, day()), Err(CoreError::Validation(_)));
    }

    #[test]
    fn bad_marital_status_rejected() {
        let mut input = sample();
        input.marital_status = Some("engaged".into());
        assert_matches!(validate_new_cv(&input, day()), Err(CoreError::Validation(_)));
    }

    #[test]
    fn update_checks_only_present_fields() {
        assert!(validate_cv_update(&UpdateCv::default(), day()).is_ok());

        let update = UpdateCv {
            gender: Some("unknown".into()),
            ..UpdateCv::default()
        };
        assert!(validate_cv_update(&update, day()).is_err());

        let update = UpdateCv {
            full_name: Some(String::new()),
            ..UpdateCv::default()
        };
        assert!(validate_cv_update(&update, day()).is_err());
    }
}
