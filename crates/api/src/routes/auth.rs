//! `/auth` routes.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Registration and the token lifecycle are public. `logout` and `me` take an
/// `AuthUser`, so they answer 401 without a bearer token.
pub fn router() -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh));

    public
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}
