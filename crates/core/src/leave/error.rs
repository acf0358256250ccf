//! Leave domain validation errors.

use chrono::NaiveDate;
use thiserror::Error;

use super::types::RequestStatus;

/// Errors raised by pure leave-domain validation.
#[derive(Debug, Error)]
pub enum LeaveError {
    /// The request's start date falls after its end date.
    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange {
        /// First day of leave.
        start: NaiveDate,
        /// Last day of leave.
        end: NaiveDate,
    },

    /// The stored day count disagrees with the working-day calendar.
    #[error("Request claims {actual} days but the span holds {expected} working days")]
    WrongDayCount {
        /// Working days in the span per the calendar.
        expected: i32,
        /// Days stored on the request.
        actual: i32,
    },

    /// The stored period disagrees with the start date's year.
    #[error("Stored period {stored:?} does not match start date year {derived}")]
    PeriodMismatch {
        /// Period as stored, possibly unset.
        stored: Option<i32>,
        /// Year derived from the start date.
        derived: i32,
    },

    /// The quota year lies after the execution period.
    #[error("Quota year {quota_year} lies after period {period}")]
    QuotaYearAhead {
        /// Year whose quota the request claims to draw.
        quota_year: i32,
        /// The request's execution period.
        period: i32,
    },

    /// A status write outside the allowed state machine.
    #[error("Cannot transition request from {from:?} to {to:?}")]
    InvalidStatusTransition {
        /// Current status.
        from: RequestStatus,
        /// Requested status.
        to: RequestStatus,
    },

    /// The leave type does not allow carry-over.
    #[error("Leave type \"{0}\" does not allow deferral")]
    DeferralNotAllowed(String),

    /// A grant or request carries a non-positive day count.
    #[error("Day count must be positive, got {0}")]
    InvalidDays(i32),
}

impl LeaveError {
    /// Returns a stable machine-readable code for host mapping.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::WrongDayCount { .. } => "WRONG_DAY_COUNT",
            Self::PeriodMismatch { .. } => "PERIOD_MISMATCH",
            Self::QuotaYearAhead { .. } => "QUOTA_YEAR_AHEAD",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::DeferralNotAllowed(_) => "DEFERRAL_NOT_ALLOWED",
            Self::InvalidDays(_) => "INVALID_DAYS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LeaveError::InvalidDays(0).error_code(), "INVALID_DAYS");
        assert_eq!(
            LeaveError::DeferralNotAllowed("Sick leave".into()).error_code(),
            "DEFERRAL_NOT_ALLOWED"
        );
        assert_eq!(
            LeaveError::WrongDayCount {
                expected: 5,
                actual: 7
            }
            .error_code(),
            "WRONG_DAY_COUNT"
        );
    }

    #[test]
    fn test_error_display() {
        let err = LeaveError::WrongDayCount {
            expected: 5,
            actual: 7,
        };
        assert_eq!(
            err.to_string(),
            "Request claims 7 days but the span holds 5 working days"
        );
    }
}
