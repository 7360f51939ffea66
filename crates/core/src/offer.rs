//! Offer (reservation request) lifecycle rules.

use chrono::Duration;

use crate::error::CoreError;
use crate::status::OfferStatus;
use crate::types::Timestamp;

/// Hours a pending offer stays open when no override is configured.
pub const DEFAULT_OFFER_EXPIRY_HOURS: i64 = 72;

/// Compute the expiry stamp for an offer created at `now`.
pub fn expiry_from(now: Timestamp, hours: i64) -> Timestamp {
    now + Duration::hours(hours)
}

/// A pending offer whose expiry has passed is treated as expired.
pub fn is_expired(status: OfferStatus, expires_at: Timestamp, now: Timestamp) -> bool {
    status == OfferStatus::Pending && expires_at <= now
}

/// Only pending offers can be accepted or rejected.
pub fn ensure_respondable(status: OfferStatus) -> Result<(), CoreError> {
    if status == OfferStatus::Pending {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Offer is already {status} and cannot be answered"
        )))
    }
}

/// Pending offers can always be cancelled; accepted ones only while the
/// placement process has not completed any step.
pub fn ensure_cancellable(status: OfferStatus, completed_steps: i16) -> Result<(), CoreError> {
    match status {
        OfferStatus::Pending => Ok(()),
        OfferStatus::Accepted if completed_steps == 0 => Ok(()),
        OfferStatus::Accepted => Err(CoreError::Conflict(
            "Offer cannot be cancelled once the process has started".into(),
        )),
        other => Err(CoreError::Conflict(format!(
            "Offer is already {other} and cannot be cancelled"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn expiry_adds_hours() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let exp = expiry_from(now, DEFAULT_OFFER_EXPIRY_HOURS);
        assert_eq!(exp, Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap());
    }

    #[test]
    fn only_pending_offers_expire() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let past = now - Duration::minutes(1);
        assert!(is_expired(OfferStatus::Pending, past, now));
        assert!(is_expired(OfferStatus::Pending, now, now));
        assert!(!is_expired(OfferStatus::Accepted, past, now));
        assert!(!is_expired(OfferStatus::Pending, now + Duration::hours(1), now));
    }

    #[test]
    fn respondable_only_when_pending() {
        assert!(ensure_respondable(OfferStatus::Pending).is_ok());
        assert_matches!(
            ensure_respondable(OfferStatus::Rejected),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn cancellation_rules() {
        assert!(ensure_cancellable(OfferStatus::Pending, 0).is_ok());
        assert!(ensure_cancellable(OfferStatus::Accepted, 0).is_ok());
        assert!(ensure_cancellable(OfferStatus::Accepted, 2).is_err());
        assert!(ensure_cancellable(OfferStatus::Cancelled, 0).is_err());
    }
}
