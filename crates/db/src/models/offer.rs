//! Offer (reservation request) model and DTOs.

use placement_core::status::{OfferStatus, StatusId};
use placement_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `offers` table, plus the owner of the CV it targets.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Offer {
    pub id: DbId,
    pub cv_id: DbId,
    pub employer_id: DbId,
    pub job_id: Option<DbId>,
    pub salary: Option<i32>,
    pub message: Option<String>,
    pub status_id: StatusId,
    pub response_note: Option<String>,
    pub expires_at: Timestamp,
    pub responded_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub cv_owner_id: DbId,
}

impl Offer {
    pub fn status(&self) -> OfferStatus {
        OfferStatus::from_id(self.status_id).unwrap_or(OfferStatus::Cancelled)
    }
}

/// DTO for `POST /offers`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOffer {
    pub cv_id: DbId,
    pub job_id: Option<DbId>,
    #[validate(range(min = 0))]
    pub salary: Option<i32>,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

/// Optional note attached to a response (reject, process step, ...).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RespondNote {
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

/// Query parameters for `GET /offers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferListQuery {
    pub status: Option<String>,
    pub cv_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
