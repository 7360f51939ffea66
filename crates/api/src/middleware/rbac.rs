//! Role-gated extractors for endpoints that only make sense for one kind of
//! account. Row-level checks still go through `placement_core::access`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use placement_core::error::CoreError;
use placement_core::roles::Role;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Platform administrators only.
///
/// ```ignore
/// async fn review(RequireAdmin(admin): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

/// Accounts that register and manage worker CVs (agents, recruitment
/// companies), plus admins.
pub struct RequireWorkerManager(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        gate(parts, state, |role| role == Role::Admin, "Admin role required")
            .await
            .map(RequireAdmin)
    }
}

impl FromRequestParts<AppState> for RequireWorkerManager {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        gate(
            parts,
            state,
            |role| role == Role::Admin || role.manages_workers(),
            "Only agents and recruitment companies manage worker profiles",
        )
        .await
        .map(RequireWorkerManager)
    }
}

async fn gate(
    parts: &mut Parts,
    state: &AppState,
    allowed: impl Fn(Role) -> bool,
    refusal: &str,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if !allowed(user.role) {
        tracing::debug!(user_id = user.user_id, role = %user.role, "Role gate refused");
        return Err(AppError::Core(CoreError::Forbidden(refusal.into())));
    }
    Ok(user)
}
