//! Management transfer rules.

use crate::error::CoreError;
use crate::roles::Role;
use crate::status::{CvStatus, TransferStatus};
use crate::types::DbId;

/// Check the parties and CV state before a transfer request is recorded.
pub fn validate_request(
    from_user_id: DbId,
    to_user_id: DbId,
    to_role: Role,
    to_is_active: bool,
    cv_status: CvStatus,
) -> Result<(), CoreError> {
    if from_user_id == to_user_id {
        return Err(CoreError::Validation(
            "Cannot transfer a CV to its current owner".into(),
        ));
    }
    if !to_role.manages_workers() {
        return Err(CoreError::Validation(format!(
            "CVs can only be transferred to agent or recruitment accounts, not {to_role}"
        )));
    }
    if !to_is_active {
        return Err(CoreError::Validation(
            "Target account is deactivated".into(),
        ));
    }
    if !matches!(cv_status, CvStatus::Available | CvStatus::Withdrawn) {
        return Err(CoreError::Conflict(format!(
            "CV is {cv_status} and cannot be transferred"
        )));
    }
    Ok(())
}

/// Only pending transfers can be accepted, rejected or cancelled.
pub fn ensure_pending(status: TransferStatus) -> Result<(), CoreError> {
    if status == TransferStatus::Pending {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!("Transfer is already {status}")))
    }
}
