pub mod admin;
pub mod auth;
pub mod cvs;
pub mod dashboard;
pub mod health;
pub mod jobs;
pub mod notifications;
pub mod offers;
pub mod payments;
pub mod transfers;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register, /auth/login, /auth/refresh       public
/// /auth/logout, /auth/me                           requires auth
///
/// /admin/roles                                     seeded roles (admin only)
/// /admin/users                                     list, create
/// /admin/users/{id}                                get, update, deactivate
/// /admin/users/{id}/reset-password                 reset password
///
/// /cvs                                             list, create
/// /cvs/mrz                                         passport MRZ prefill
/// /cvs/{id}                                        get, update, delete
/// /cvs/{id}/withdraw, /cvs/{id}/publish            availability toggle
/// /cvs/{id}/process                                placement progress
/// /cvs/{id}/process/advance, /process/revert       step changes
///
/// /jobs                                            list, create
/// /jobs/{id}                                       get, update, delete
/// /jobs/{id}/close                                 close posting
///
/// /offers                                          list, create
/// /offers/{id}                                     get
/// /offers/{id}/accept, /reject, /cancel            respond or withdraw
///
/// /transfers                                       list, create
/// /transfers/{id}                                  get
/// /transfers/{id}/accept, /reject, /cancel         respond or withdraw
///
/// /payments                                        list, create
/// /payments/{id}                                   get
/// /payments/{id}/confirm, /reject                  admin review
///
/// /notifications                                   caller's inbox
/// /notifications/unread-count, /read-all
/// /notifications/{id}/read
///
/// /dashboard                                       caller-scoped counters
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .nest("/cvs", cvs::router())
        .nest("/jobs", jobs::router())
        .nest("/offers", offers::router())
        .nest("/transfers", transfers::router())
        .nest("/payments", payments::router())
        .nest("/notifications", notifications::router())
        .nest("/dashboard", dashboard::router())
}
