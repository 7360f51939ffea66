use axum::routing::{get, post};
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Routes mounted at `/payments`.
///
/// ```text
/// GET  /              -> list_payments
/// POST /              -> create_payment
/// GET  /{id}          -> get_payment
/// POST /{id}/confirm  -> confirm_payment (admin)
/// POST /{id}/reject   -> reject_payment (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(payments::list_payments).post(payments::create_payment),
        )
        .route("/{id}", get(payments::get_payment))
        .route("/{id}/confirm", post(payments::confirm_payment))
        .route("/{id}/reject", post(payments::reject_payment))
}
