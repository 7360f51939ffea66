//! Job posting model and DTOs.

use placement_core::status::{JobStatus, StatusId};
use placement_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub owner_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub country: String,
    pub city: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub currency: String,
    pub positions: i32,
    pub status_id: StatusId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Job {
    pub fn status(&self) -> JobStatus {
        JobStatus::from_id(self.status_id).unwrap_or(JobStatus::Closed)
    }
}

/// DTO for creating a job posting.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateJob {
    #[validate(length(min = 3, max = 200))]
    pub title: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub country: String,
    pub city: Option<String>,
    #[validate(range(min = 0))]
    pub salary_min: Option<i32>,
    #[validate(range(min = 0))]
    pub salary_max: Option<i32>,
    /// Defaults to `SAR` when omitted.
    pub currency: Option<String>,
    /// Defaults to 1 when omitted.
    #[validate(range(min = 1))]
    pub positions: Option<i32>,
}

/// DTO for updating a job posting. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateJob {
    #[validate(length(min = 3, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub country: Option<String>,
    pub city: Option<String>,
    #[validate(range(min = 0))]
    pub salary_min: Option<i32>,
    #[validate(range(min = 0))]
    pub salary_max: Option<i32>,
    pub currency: Option<String>,
    #[validate(range(min = 1))]
    pub positions: Option<i32>,
}

/// Query parameters for `GET /jobs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobListQuery {
    pub status: Option<String>,
    pub country: Option<String>,
    pub search: Option<String>,
    /// Only the caller's own postings.
    #[serde(default)]
    pub owner_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
