//! Handlers for the caller's own notification inbox.

use axum::extract::{Path, Query, State};
use axum::Json;
use placement_core::error::CoreError;
use placement_core::pagination::{Page, PageParams};
use placement_core::types::DbId;
use placement_db::models::notification::{Notification, NotificationQuery};
use placement_db::repositories::NotificationRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{CountResponse, DataResponse};
use crate::state::AppState;

/// GET /api/v1/notifications
///
/// Newest first. `?unread_only=true` hides read notifications.
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<DataResponse<Page<Notification>>>> {
    let page = PageParams::new(query.limit, query.offset);
    let notifications =
        NotificationRepo::list_for_user(&state.pool, auth.user_id, query.unread_only, &page)
            .await?;
    Ok(Json(DataResponse {
        data: notifications,
    }))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<CountResponse>>> {
    let count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: CountResponse { count },
    }))
}

/// POST /api/v1/notifications/{id}/read
///
/// Another user's notification is reported as missing.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Notification>>> {
    let notification = NotificationRepo::mark_read(&state.pool, id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id,
        }))?;
    Ok(Json(DataResponse { data: notification }))
}

/// POST /api/v1/notifications/read-all
///
/// Returns how many notifications changed.
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<CountResponse>>> {
    let updated = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;
    tracing::debug!(user_id = auth.user_id, updated, "Notifications marked read");
    Ok(Json(DataResponse {
        data: CountResponse {
            count: updated as i64,
        },
    }))
}
