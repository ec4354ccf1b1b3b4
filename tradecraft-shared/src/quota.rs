/// Staff quota enforcement
///
/// Each business caps its staff headcount with `max_staff_count`. The
/// enforcement path runs inside a transaction that row-locks the
/// business, so two concurrent staff creations cannot both slip under
/// the limit: the second blocks on the lock and re-reads the updated
/// counter.
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::business::Business;

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("staff limit reached: {current} of {limit} seats used")]
    LimitExceeded { current: i32, limit: i32 },

    #[error("business {0} not found")]
    BusinessNotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of a quota check.
#[derive(Debug, Clone, Serialize)]
pub struct QuotaCheckResult {
    pub allowed: bool,
    pub current: i32,
    pub limit: i32,
    pub remaining: i32,
}

impl QuotaCheckResult {
    fn from_counts(current: i32, limit: i32) -> Self {
        QuotaCheckResult {
            allowed: current < limit,
            current,
            limit,
            remaining: (limit - current).max(0),
        }
    }
}

pub struct StaffQuota;

impl StaffQuota {
    /// Non-binding check against the current counter. Advisory only; the
    /// authoritative check is [`StaffQuota::enforce_locked`].
    pub async fn check(pool: &PgPool, business_id: Uuid) -> Result<QuotaCheckResult, QuotaError> {
        let business = Business::find_by_id(pool, business_id)
            .await?
            .ok_or(QuotaError::BusinessNotFound(business_id))?;
        Ok(QuotaCheckResult::from_counts(
            business.staff_count,
            business.max_staff_count,
        ))
    }

    /// Locks the business row and fails if no seat is free. Must run
    /// inside the same transaction as the staff insert and the counter
    /// increment; the returned business reflects the locked row.
    pub async fn enforce_locked(
        conn: &mut sqlx::PgConnection,
        business_id: Uuid,
    ) -> Result<Business, QuotaError> {
        let business = Business::lock_for_update(conn, business_id)
            .await?
            .ok_or(QuotaError::BusinessNotFound(business_id))?;

        let result = QuotaCheckResult::from_counts(business.staff_count, business.max_staff_count);
        if !result.allowed {
            return Err(QuotaError::LimitExceeded {
                current: result.current,
                limit: result.limit,
            });
        }

        Ok(business)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_under_limit() {
        let r = QuotaCheckResult::from_counts(3, 10);
        assert!(r.allowed);
        assert_eq!(r.remaining, 7);
    }

    #[test]
    fn test_check_result_at_limit() {
        let r = QuotaCheckResult::from_counts(10, 10);
        assert!(!r.allowed);
        assert_eq!(r.remaining, 0);
    }

    #[test]
    fn test_check_result_over_limit_clamps_remaining() {
        // Limit lowered below the live headcount: nothing may be added
        // and remaining never goes negative.
        let r = QuotaCheckResult::from_counts(12, 10);
        assert!(!r.allowed);
        assert_eq!(r.remaining, 0);
    }

    #[test]
    fn test_zero_limit_blocks_all() {
        let r = QuotaCheckResult::from_counts(0, 0);
        assert!(!r.allowed);
    }

    // Locking behavior is exercised by the database integration tests.
}
