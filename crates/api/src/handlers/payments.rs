//! Handlers for the `/payments` resource.
//!
//! Payments are recorded by hand against accepted offers and confirmed or
//! rejected by an admin; no payment gateway is involved.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use placement_core::access::{authorize_create, Action, Relation, Resource};
use placement_core::error::CoreError;
use placement_core::job::validate_currency;
use placement_core::pagination::Page;
use placement_core::payment;
use placement_core::status::PaymentStatus;
use placement_core::types::DbId;
use placement_db::models::offer::Offer;
use placement_db::models::payment::{CreatePayment, Payment, PaymentListQuery};
use placement_db::repositories::{BaseRepo, Entity, PaymentRepo};
use validator::Validate;

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/payments
///
/// The employer of an accepted offer records a payment. Returns 201.
pub async fn create_payment(
    mut ctx: RequestContext,
    State(state): State<AppState>,
    Json(mut input): Json<CreatePayment>,
) -> AppResult<Response> {
    authorize_create(&ctx.actor, Resource::Payment)?;
    input.validate()?;
    input.currency = input.currency.trim().to_uppercase();
    validate_currency(&input.currency)?;
    payment::validate_method(&input.method)?;
    payment::validate_amount(input.amount_cents)?;

    let offer =
        BaseRepo::<Offer>::find_authorized(&state.pool, &ctx.actor, Action::Read, input.offer_id)
            .await?;
    if !ctx.actor.is_admin() && offer.relation(&ctx.actor) != Relation::Owner {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the employer who made the offer can record payments".into(),
        )));
    }

    let created = PaymentRepo::create(&state.pool, &input).await?;
    tracing::info!(
        payment_id = created.id,
        offer_id = created.offer_id,
        amount_cents = created.amount_cents,
        "Payment recorded",
    );

    ctx.set_response(StatusCode::CREATED, "Payment recorded; awaiting confirmation");
    Ok(ctx.respond(created))
}

/// GET /api/v1/payments
pub async fn list_payments(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PaymentListQuery>,
) -> AppResult<Json<DataResponse<Page<Payment>>>> {
    let page = PaymentRepo::list(&state.pool, &auth.actor(), &query).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/payments/{id}
pub async fn get_payment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Payment>>> {
    let payment =
        BaseRepo::<Payment>::find_authorized(&state.pool, &auth.actor(), Action::Read, id).await?;
    Ok(Json(DataResponse { data: payment }))
}

/// POST /api/v1/payments/{id}/confirm
pub async fn confirm_payment(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    review(
        state,
        RequestContext::new(admin),
        id,
        PaymentStatus::Confirmed,
        "Payment confirmed",
    )
    .await
}

/// POST /api/v1/payments/{id}/reject
pub async fn reject_payment(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    review(state, RequestContext::new(admin), id, PaymentStatus::Rejected, "Payment rejected").await
}

async fn review(
    state: AppState,
    mut ctx: RequestContext,
    id: DbId,
    decision: PaymentStatus,
    message: &str,
) -> AppResult<Response> {
    let reviewed = PaymentRepo::review(&state.pool, id, ctx.user_id(), decision).await?;
    ctx.set_response(StatusCode::OK, message);
    Ok(ctx.respond(reviewed))
}
