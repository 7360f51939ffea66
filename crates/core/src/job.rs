//! Job posting validation.

use crate::error::CoreError;

/// Validate an ISO 4217 style currency code (three uppercase ASCII letters).
pub fn validate_currency(code: &str) -> Result<(), CoreError> {
    if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid currency '{code}'. Expected a three-letter uppercase code"
        )))
    }
}

/// Validate an optional salary range. Both bounds must be non-negative and
/// `min <= max` when both are present.
pub fn validate_salary_range(min: Option<i32>, max: Option<i32>) -> Result<(), CoreError> {
    if min.is_some_and(|v| v < 0) || max.is_some_and(|v| v < 0) {
        return Err(CoreError::Validation(
            "Salary values cannot be negative".into(),
        ));
    }
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(CoreError::Validation(format!(
                "salary_min ({lo}) cannot exceed salary_max ({hi})"
            )));
        }
    }
    Ok(())
}
