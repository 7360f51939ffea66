//! Worker profile (CV) model and DTOs.

use chrono::NaiveDate;
use placement_core::status::{CvStatus, StatusId};
use placement_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `cvs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Cv {
    pub id: DbId,
    pub owner_id: DbId,
    pub created_by: DbId,
    pub full_name: String,
    pub passport_number: String,
    pub nationality: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub marital_status: Option<String>,
    pub religion: Option<String>,
    pub profession: String,
    pub experience_years: i32,
    pub languages: Vec<String>,
    pub expected_salary: Option<i32>,
    pub summary: Option<String>,
    pub photo_url: Option<String>,
    pub passport_url: Option<String>,
    pub video_url: Option<String>,
    pub status_id: StatusId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Cv {
    /// Decoded status. Unknown ids fall back to `Withdrawn` so they are never offered.
    pub fn status(&self) -> CvStatus {
        CvStatus::from_id(self.status_id).unwrap_or(CvStatus::Withdrawn)
    }
}

/// DTO for creating a CV. The owner is always the caller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCv {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    pub passport_number: String,
    #[validate(length(min = 2, max = 100))]
    pub nationality: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub marital_status: Option<String>,
    #[validate(length(max = 100))]
    pub religion: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub profession: String,
    #[serde(default)]
    pub experience_years: i32,
    #[serde(default)]
    pub languages: Vec<String>,
    #[validate(range(min = 0))]
    pub expected_salary: Option<i32>,
    #[validate(length(max = 5000))]
    pub summary: Option<String>,
    #[validate(url)]
    pub photo_url: Option<String>,
    #[validate(url)]
    pub passport_url: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
}

/// DTO for updating a CV. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCv {
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,
    pub passport_number: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub marital_status: Option<String>,
    #[validate(length(max = 100))]
    pub religion: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub profession: Option<String>,
    pub experience_years: Option<i32>,
    pub languages: Option<Vec<String>>,
    #[validate(range(min = 0))]
    pub expected_salary: Option<i32>,
    #[validate(length(max = 5000))]
    pub summary: Option<String>,
    #[validate(url)]
    pub photo_url: Option<String>,
    #[validate(url)]
    pub passport_url: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
}

/// Query parameters for `GET /cvs`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CvListQuery {
    /// Status name, e.g. `available`.
    pub status: Option<String>,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub profession: Option<String>,
    #[validate(range(max = 150))]
    pub min_age: Option<u32>,
    #[validate(range(max = 150))]
    pub max_age: Option<u32>,
    /// Substring of the worker's name.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
