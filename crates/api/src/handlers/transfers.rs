//! Handlers for the `/transfers` resource: moving a CV to another managing account.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use placement_core::access::{authorize_create, Action, Resource};
use placement_core::pagination::Page;
use placement_core::types::DbId;
use placement_db::models::transfer::{CreateTransfer, Transfer, TransferListQuery};
use placement_db::repositories::{BaseRepo, CvRepo, TransferRepo};
use validator::Validate;

use crate::context::RequestContext;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/transfers
///
/// The CV owner asks another agent or recruitment account to take the CV
/// over. One pending transfer per CV. Returns 201.
pub async fn create_transfer(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Json(input): Json<CreateTransfer>,
) -> AppResult<Response> {
    authorize_create(&ctx.actor, Resource::Transfer)?;
    input.validate()?;
    CvRepo::find_authorized(&state.pool, &ctx.actor, Action::Update, input.cv_id).await?;

    let created = TransferRepo::create(&state.pool, &input).await?;
    tracing::info!(
        transfer_id = created.id,
        cv_id = created.cv_id,
        from_user_id = created.from_user_id,
        to_user_id = created.to_user_id,
        "Transfer requested",
    );

    ctx.set_response(StatusCode::CREATED, "Transfer requested");
    Ok(ctx.respond(created))
}

/// GET /api/v1/transfers
///
/// Transfers the caller requested or received. Admins see all.
pub async fn list_transfers(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<TransferListQuery>,
) -> AppResult<Json<DataResponse<Page<Transfer>>>> {
    let page = TransferRepo::list(&state.pool, &auth.actor(), &query).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/transfers/{id}
pub async fn get_transfer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Transfer>>> {
    let transfer =
        BaseRepo::<Transfer>::find_authorized(&state.pool, &auth.actor(), Action::Read, id)
            .await?;
    Ok(Json(DataResponse { data: transfer }))
}

/// POST /api/v1/transfers/{id}/accept
///
/// The target takes ownership. Pending offers on the CV are cancelled.
pub async fn accept_transfer(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    BaseRepo::<Transfer>::find_authorized(&state.pool, &ctx.actor, Action::Respond, id).await?;
    let transfer = TransferRepo::accept(&state.pool, id).await?;

    ctx.set_response(StatusCode::OK, "Transfer accepted; you now manage this CV");
    Ok(ctx.respond(transfer))
}

/// POST /api/v1/transfers/{id}/reject
pub async fn reject_transfer(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    BaseRepo::<Transfer>::find_authorized(&state.pool, &ctx.actor, Action::Respond, id).await?;
    let transfer = TransferRepo::reject(&state.pool, id).await?;
    tracing::info!(transfer_id = id, user_id = ctx.user_id(), "Transfer rejected");

    ctx.set_response(StatusCode::OK, "Transfer rejected");
    Ok(ctx.respond(transfer))
}

/// POST /api/v1/transfers/{id}/cancel
pub async fn cancel_transfer(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    BaseRepo::<Transfer>::find_authorized(&state.pool, &ctx.actor, Action::Delete, id).await?;
    let transfer = TransferRepo::cancel(&state.pool, id).await?;
    tracing::info!(transfer_id = id, user_id = ctx.user_id(), "Transfer cancelled");

    ctx.set_response(StatusCode::OK, "Transfer cancelled");
    Ok(ctx.respond(transfer))
}
