//! Route definitions for the `/jobs` board.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /            -> list_jobs
/// POST   /            -> create_job
/// GET    /{id}        -> get_job
/// PUT    /{id}        -> update_job
/// DELETE /{id}        -> delete_job
/// POST   /{id}/close  -> close_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(jobs::list_jobs).post(jobs::create_job))
        .route(
            "/{id}",
            get(jobs::get_job)
                .put(jobs::update_job)
                .delete(jobs::delete_job),
        )
        .route("/{id}/close", post(jobs::close_job))
}
