//! Management transfer model and DTOs.

use placement_core::status::{StatusId, TransferStatus};
use placement_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `transfers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Transfer {
    pub id: DbId,
    pub cv_id: DbId,
    pub from_user_id: DbId,
    pub to_user_id: DbId,
    pub note: Option<String>,
    pub status_id: StatusId,
    pub responded_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Transfer {
    pub fn status(&self) -> TransferStatus {
        TransferStatus::from_id(self.status_id).unwrap_or(TransferStatus::Cancelled)
    }
}

/// DTO for `POST /transfers`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTransfer {
    pub cv_id: DbId,
    pub to_user_id: DbId,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

/// Query parameters for `GET /transfers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
