//! Manually recorded payment rules.

use crate::error::CoreError;
use crate::status::PaymentStatus;

pub const METHOD_BANK_TRANSFER: &str = "bank_transfer";
pub const METHOD_CASH: &str = "cash";
pub const METHOD_CARD: &str = "card";
pub const METHOD_CHEQUE: &str = "cheque";

pub const VALID_METHODS: &[&str] = &[METHOD_BANK_TRANSFER, METHOD_CASH, METHOD_CARD, METHOD_CHEQUE];

pub fn validate_method(method: &str) -> Result<(), CoreError> {
    if VALID_METHODS.contains(&method) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid payment method '{method}'. Must be one of: {}",
            VALID_METHODS.join(", ")
        )))
    }
}

pub fn validate_amount(amount_cents: i64) -> Result<(), CoreError> {
    if amount_cents > 0 {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "amount_cents must be greater than zero".into(),
        ))
    }
}

pub fn ensure_reviewable(status: PaymentStatus) -> Result<(), CoreError> {
    if status == PaymentStatus::Pending {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Payment is already {status}"
        )))
    }
}
