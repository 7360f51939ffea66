//! Route definitions for the `/transfers` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::transfers;
use crate::state::AppState;

/// Routes mounted at `/transfers`.
///
/// ```text
/// GET  /              -> list_transfers
/// POST /              -> create_transfer
/// GET  /{id}          -> get_transfer
/// POST /{id}/accept   -> accept_transfer
/// POST /{id}/reject   -> reject_transfer
/// POST /{id}/cancel   -> cancel_transfer
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(transfers::list_transfers).post(transfers::create_transfer),
        )
        .route("/{id}", get(transfers::get_transfer))
        .route("/{id}/accept", post(transfers::accept_transfer))
        .route("/{id}/reject", post(transfers::reject_transfer))
        .route("/{id}/cancel", post(transfers::cancel_transfer))
}
