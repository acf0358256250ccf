//! Submission-time request validation.

use crate::calendar::{self, HolidaySet};

use super::error::LeaveError;
use super::quota;
use super::types::{LeaveRequest, RequestStatus};

/// Validates a request against the working-day calendar and year invariants.
///
/// # Errors
///
/// Returns the first violated rule: inverted date range, a day count that
/// disagrees with the calendar, a stored period that disagrees with the
/// start date, or a quota year ahead of the period.
pub fn validate_request(request: &LeaveRequest, holidays: &HolidaySet) -> Result<(), LeaveError> {
    if request.start_date > request.end_date {
        return Err(LeaveError::InvalidDateRange {
            start: request.start_date,
            end: request.end_date,
        });
    }

    let expected = calendar::working_days(request.start_date, request.end_date, holidays);
    if request.days_requested != expected {
        return Err(LeaveError::WrongDayCount {
            expected,
            actual: request.days_requested,
        });
    }

    let derived = quota::execution_year(request);
    if request.leave_period != Some(derived) {
        return Err(LeaveError::PeriodMismatch {
            stored: request.leave_period,
            derived,
        });
    }

    if let Some(quota_year) = request.leave_quota_year {
        if quota_year > derived {
            return Err(LeaveError::QuotaYearAhead {
                quota_year,
                period: derived,
            });
        }
    }

    Ok(())
}

/// Validates a status write against the request state machine.
///
/// # Errors
///
/// Returns `InvalidStatusTransition` when the move is outside
/// pending → approved → processed/completed or pending → rejected.
pub fn validate_transition(from: RequestStatus, to: RequestStatus) -> Result<(), LeaveError> {
    if from.can_transition(to) {
        Ok(())
    } else {
        Err(LeaveError::InvalidStatusTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use furlough_shared::types::{EmployeeId, LeaveRequestId, LeaveTypeId};

    fn request(start: &str, end: &str, days: i32, period: Option<i32>) -> LeaveRequest {
        LeaveRequest {
            id: LeaveRequestId::new(),
            employee_id: EmployeeId::new(),
            leave_type_id: LeaveTypeId::new(),
            start_date: start.parse::<NaiveDate>().unwrap(),
            end_date: end.parse::<NaiveDate>().unwrap(),
            days_requested: days,
            leave_period: period,
            leave_quota_year: None,
            status: RequestStatus::Pending,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        // Mon-Fri, five working days
        let req = request("2025-01-20", "2025-01-24", 5, Some(2025));
        assert!(validate_request(&req, &HolidaySet::empty()).is_ok());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let req = request("2025-01-24", "2025-01-20", 0, Some(2025));
        assert!(matches!(
            validate_request(&req, &HolidaySet::empty()),
            Err(LeaveError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_day_count_checked_against_holidays() {
        let holidays: HolidaySet = ["2025-01-22".parse::<NaiveDate>().unwrap()]
            .into_iter()
            .collect();

        let req = request("2025-01-20", "2025-01-24", 5, Some(2025));
        assert!(matches!(
            validate_request(&req, &holidays),
            Err(LeaveError::WrongDayCount {
                expected: 4,
                actual: 5
            })
        ));

        let req = request("2025-01-20", "2025-01-24", 4, Some(2025));
        assert!(validate_request(&req, &holidays).is_ok());
    }

    #[test]
    fn test_period_must_match_start_date() {
        let req = request("2025-01-20", "2025-01-24", 5, Some(2024));
        assert!(matches!(
            validate_request(&req, &HolidaySet::empty()),
            Err(LeaveError::PeriodMismatch {
                stored: Some(2024),
                derived: 2025
            })
        ));
    }

    #[test]
    fn test_quota_year_cannot_lie_ahead() {
        let mut req = request("2025-01-20", "2025-01-24", 5, Some(2025));
        req.leave_quota_year = Some(2026);
        assert!(matches!(
            validate_request(&req, &HolidaySet::empty()),
            Err(LeaveError::QuotaYearAhead {
                quota_year: 2026,
                period: 2025
            })
        ));
    }

    #[test]
    fn test_transition_guard() {
        assert!(validate_transition(RequestStatus::Pending, RequestStatus::Approved).is_ok());
        assert!(matches!(
            validate_transition(RequestStatus::Rejected, RequestStatus::Approved),
            Err(LeaveError::InvalidStatusTransition { .. })
        ));
    }
}
