//! Manually recorded payment model and DTOs.

use placement_core::status::{PaymentStatus, StatusId};
use placement_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `payments` table, plus the owner of the placed CV.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub offer_id: DbId,
    pub payer_id: DbId,
    pub amount_cents: i64,
    pub currency: String,
    pub method: String,
    pub reference: Option<String>,
    pub status_id: StatusId,
    pub reviewed_by: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub cv_owner_id: DbId,
}

impl Payment {
    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::from_id(self.status_id).unwrap_or(PaymentStatus::Rejected)
    }
}

/// DTO for `POST /payments`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePayment {
    pub offer_id: DbId,
    pub amount_cents: i64,
    pub currency: String,
    pub method: String,
    #[validate(length(max = 200))]
    pub reference: Option<String>,
}

/// Query parameters for `GET /payments`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentListQuery {
    pub status: Option<String>,
    pub offer_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
