//! Route definitions for the `/cvs` resource and its placement process.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::cvs;
use crate::state::AppState;

/// Routes mounted at `/cvs`.
///
/// ```text
/// GET    /                       -> list_cvs
/// POST   /                       -> create_cv
/// POST   /mrz                    -> parse_mrz
/// GET    /{id}                   -> get_cv
/// PUT    /{id}                   -> update_cv
/// DELETE /{id}                   -> delete_cv
/// POST   /{id}/withdraw          -> withdraw_cv
/// POST   /{id}/publish           -> publish_cv
/// GET    /{id}/process           -> get_process
/// POST   /{id}/process/advance   -> advance_process
/// POST   /{id}/process/revert    -> revert_process (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cvs::list_cvs).post(cvs::create_cv))
        .route("/mrz", post(cvs::parse_mrz))
        .route(
            "/{id}",
            get(cvs::get_cv).put(cvs::update_cv).delete(cvs::delete_cv),
        )
        .route("/{id}/withdraw", post(cvs::withdraw_cv))
        .route("/{id}/publish", post(cvs::publish_cv))
        .route("/{id}/process", get(cvs::get_process))
        .route("/{id}/process/advance", post(cvs::advance_process))
        .route("/{id}/process/revert", post(cvs::revert_process))
}
