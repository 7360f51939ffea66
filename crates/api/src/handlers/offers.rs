//! Handlers for the `/offers` resource: employers reserving CVs.
//!
//! Who may do what is decided by `placement_core::access`; the repository
//! re-checks offer and CV state under row locks inside one transaction.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use placement_core::access::{authorize_create, Action, Resource};
use placement_core::offer::expiry_from;
use placement_core::pagination::Page;
use placement_core::types::DbId;
use placement_db::models::offer::{CreateOffer, Offer, OfferListQuery, RespondNote};
use placement_db::models::process::CvProcess;
use placement_db::repositories::{BaseRepo, OfferRepo};
use serde::Serialize;
use validator::Validate;

use crate::context::RequestContext;
use crate::error::AppResult;
use crate::handlers::cvs::note_from;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Payload of a successful acceptance.
#[derive(Debug, Serialize)]
pub struct AcceptedOffer {
    pub offer: Offer,
    pub process: CvProcess,
}

/// POST /api/v1/offers
///
/// Reserve request on an available CV. Expires after the configured number
/// of hours. Returns 201.
pub async fn create_offer(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Json(input): Json<CreateOffer>,
) -> AppResult<Response> {
    authorize_create(&ctx.actor, Resource::Offer)?;
    input.validate()?;

    // A lapsed pending offer must not block a fresh one on the same CV.
    expire_lapsed(&state).await?;

    let expires_at = expiry_from(Utc::now(), state.config.offer_expiry_hours);
    let created = OfferRepo::create(&state.pool, ctx.user_id(), &input, expires_at).await?;
    tracing::info!(
        offer_id = created.id,
        cv_id = created.cv_id,
        employer_id = created.employer_id,
        %expires_at,
        "Offer created",
    );

    ctx.set_response(StatusCode::CREATED, "Offer sent");
    Ok(ctx.respond(created))
}

/// GET /api/v1/offers
///
/// Offers the caller made or received on their CVs. Admins see all.
pub async fn list_offers(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<OfferListQuery>,
) -> AppResult<Json<DataResponse<Page<Offer>>>> {
    expire_lapsed(&state).await?;
    let page = OfferRepo::list(&state.pool, &auth.actor(), &query).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/offers/{id}
pub async fn get_offer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Offer>>> {
    let offer =
        BaseRepo::<Offer>::find_authorized(&state.pool, &auth.actor(), Action::Read, id).await?;
    Ok(Json(DataResponse { data: offer }))
}

/// POST /api/v1/offers/{id}/accept
///
/// The CV owner accepts: the CV is reserved, competing offers are rejected
/// and the placement process opens. 409 if the offer expired meanwhile.
pub async fn accept_offer(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    BaseRepo::<Offer>::find_authorized(&state.pool, &ctx.actor, Action::Respond, id).await?;
    let (offer, process) = OfferRepo::accept(&state.pool, id).await?;

    ctx.set_response(StatusCode::OK, "Offer accepted; CV reserved");
    Ok(ctx.respond(AcceptedOffer { offer, process }))
}

/// POST /api/v1/offers/{id}/reject
pub async fn reject_offer(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<RespondNote>>,
) -> AppResult<Response> {
    let note = note_from(body)?;
    BaseRepo::<Offer>::find_authorized(&state.pool, &ctx.actor, Action::Respond, id).await?;
    let offer = OfferRepo::reject(&state.pool, id, note.as_deref()).await?;
    tracing::info!(offer_id = id, user_id = ctx.user_id(), "Offer rejected");

    ctx.set_response(StatusCode::OK, "Offer rejected");
    Ok(ctx.respond(offer))
}

/// POST /api/v1/offers/{id}/cancel
///
/// The employer withdraws a pending offer, or an accepted one whose process
/// has not completed a step yet (the CV becomes available again).
pub async fn cancel_offer(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    BaseRepo::<Offer>::find_authorized(&state.pool, &ctx.actor, Action::Delete, id).await?;
    let offer = OfferRepo::cancel(&state.pool, id).await?;
    tracing::info!(offer_id = id, user_id = ctx.user_id(), "Offer cancelled");

    ctx.set_response(StatusCode::OK, "Offer cancelled");
    Ok(ctx.respond(offer))
}

/// Flip pending offers past their deadline to `expired` before they are read.
pub(crate) async fn expire_lapsed(state: &AppState) -> AppResult<()> {
    let expired = OfferRepo::expire_stale(&state.pool).await?;
    if expired > 0 {
        tracing::debug!(count = expired, "Expired lapsed offers");
    }
    Ok(())
}
