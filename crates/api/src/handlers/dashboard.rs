use axum::extract::State;
use axum::Json;
use placement_db::models::dashboard::DashboardStats;
use placement_db::repositories::DashboardRepo;

use crate::error::AppResult;
use crate::handlers::offers::expire_lapsed;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/dashboard
///
/// Counters scoped to the caller; admins get platform-wide totals. Lapsed
/// offers are expired first so they do not count as pending.
pub async fn get_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DashboardStats>>> {
    expire_lapsed(&state).await?;
    let stats = DashboardRepo::stats(&state.pool, &auth.actor()).await?;
    Ok(Json(DataResponse { data: stats }))
}
