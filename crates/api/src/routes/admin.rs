//! `/admin` routes. Every handler takes `RequireAdmin`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let users = Router::new()
        .route("/", get(admin::list_users).post(admin::create_user))
        .route(
            "/{id}",
            get(admin::get_user)
                .put(admin::update_user)
                .delete(admin::deactivate_user),
        )
        .route("/{id}/reset-password", post(admin::reset_password));

    Router::new()
        .route("/roles", get(admin::list_roles))
        .nest("/users", users)
}
