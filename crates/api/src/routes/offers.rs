//! Route definitions for the `/offers` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::offers;
use crate::state::AppState;

/// Routes mounted at `/offers`.
///
/// ```text
/// GET  /              -> list_offers
/// POST /              -> create_offer
/// GET  /{id}          -> get_offer
/// POST /{id}/accept   -> accept_offer
/// POST /{id}/reject   -> reject_offer
/// POST /{id}/cancel   -> cancel_offer
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(offers::list_offers).post(offers::create_offer))
        .route("/{id}", get(offers::get_offer))
        .route("/{id}/accept", post(offers::accept_offer))
        .route("/{id}/reject", post(offers::reject_offer))
        .route("/{id}/cancel", post(offers::cancel_offer))
}
