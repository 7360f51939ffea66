//! Worker profile (CV) rules: field validation, age bounds and status transitions.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::CoreError;
use crate::status::CvStatus;

pub const GENDER_MALE: &str = "male";
pub const GENDER_FEMALE: &str = "female";
pub const VALID_GENDERS: &[&str] = &[GENDER_MALE, GENDER_FEMALE];

pub const VALID_MARITAL_STATUSES: &[&str] = &["single", "married", "divorced", "widowed"];

/// Youngest age a worker may be registered at.
pub const MIN_WORKER_AGE: u32 = 18;
/// Oldest age a worker may be registered at.
pub const MAX_WORKER_AGE: u32 = 60;
/// Largest age accepted by the `min_age` / `max_age` list filters.
pub const MAX_AGE_FILTER: u32 = 150;
/// Upper bound on declared experience.
pub const MAX_EXPERIENCE_YEARS: i32 = 50;

static PASSPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{6,20}$").expect("static regex"));

/// Uppercase and strip spaces so `"ab 12345"` and `"AB12345"` collide.
pub fn normalize_passport_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn validate_passport_number(passport: &str) -> Result<(), CoreError> {
    if PASSPORT_RE.is_match(passport) {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "Passport number must be 6-20 uppercase letters or digits".into(),
        ))
    }
}

pub fn validate_gender(gender: &str) -> Result<(), CoreError> {
    one_of("gender", gender, VALID_GENDERS)
}

pub fn validate_marital_status(status: &str) -> Result<(), CoreError> {
    one_of("marital_status", status, VALID_MARITAL_STATUSES)
}

pub fn validate_experience(years: i32) -> Result<(), CoreError> {
    if (0..=MAX_EXPERIENCE_YEARS).contains(&years) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "experience_years must be between 0 and {MAX_EXPERIENCE_YEARS}"
        )))
    }
}

/// Completed years between `dob` and `today`.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> u32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age.max(0) as u32
}

pub fn validate_age(dob: NaiveDate, today: NaiveDate) -> Result<(), CoreError> {
    if dob > today {
        return Err(CoreError::Validation(
            "date_of_birth cannot be in the future".into(),
        ));
    }
    let age = age_on(dob, today);
    if !(MIN_WORKER_AGE..=MAX_WORKER_AGE).contains(&age) {
        return Err(CoreError::Validation(format!(
            "Worker age must be between {MIN_WORKER_AGE} and {MAX_WORKER_AGE} (got {age})"
        )));
    }
    Ok(())
}

/// Latest date of birth for someone at least `age` years old on `today`.
///
/// Used to turn a `min_age` filter into a `date_of_birth <=` bound.
pub fn born_on_or_before(age: u32, today: NaiveDate) -> Result<NaiveDate, CoreError> {
    years_before(today, age)
}

/// Earliest date of birth for someone at most `age` years old on `today`.
pub fn born_after(age: u32, today: NaiveDate) -> Result<NaiveDate, CoreError> {
    let years = age.checked_add(1).ok_or_else(age_filter_out_of_range)?;
    years_before(today, years)
}

/// Check the `min_age` / `max_age` list filters before they become dates.
pub fn validate_age_filter(min_age: Option<u32>, max_age: Option<u32>) -> Result<(), CoreError> {
    if min_age.into_iter().chain(max_age).any(|age| age > MAX_AGE_FILTER) {
        return Err(age_filter_out_of_range());
    }
    if let (Some(min), Some(max)) = (min_age, max_age) {
        if min > max {
            return Err(CoreError::Validation("min_age cannot exceed max_age".into()));
        }
    }
    Ok(())
}

fn years_before(date: NaiveDate, years: u32) -> Result<NaiveDate, CoreError> {
    let year = i32::try_from(years)
        .ok()
        .and_then(|years| date.year().checked_sub(years))
        .ok_or_else(age_filter_out_of_range)?;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        // 29 February in a non-leap target year.
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .ok_or_else(age_filter_out_of_range)
}

fn age_filter_out_of_range() -> CoreError {
    CoreError::Validation(format!("Age filters must be between 0 and {MAX_AGE_FILTER}"))
}

/// Whether a CV may move from `from` to `to`.
pub fn can_transition(from: CvStatus, to: CvStatus) -> bool {
    use CvStatus::*;
    matches!(
        (from, to),
        (Available, Reserved)
            | (Available, Withdrawn)
            | (Withdrawn, Available)
            | (Reserved, Available)
            | (Reserved, InProcess)
            | (InProcess, Reserved)
            | (InProcess, Deployed)
            | (Deployed, InProcess)
    )
}

pub fn ensure_transition(from: CvStatus, to: CvStatus) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "CV cannot move from '{from}' to '{to}'"
        )))
    }
}

/// CVs that are reserved or further along are locked against deletion and transfer.
pub fn is_locked(status: CvStatus) -> bool {
    matches!(
        status,
        CvStatus::Reserved | CvStatus::InProcess | CvStatus::Deployed
    )
}

fn one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), CoreError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid {field} '{value}'. Must be one of: {}",
            allowed.join(", ")
        )))
    }
}
