//! Leave domain row types.
//!
//! These structs mirror the remote row-store tables. Year-like columns have
//! accumulated mixed representations over the system's life (integers,
//! numeric strings, nulls), so they deserialize leniently into `Option<i32>`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use furlough_shared::types::{
    DeferralLogId, EmployeeId, LeaveBalanceId, LeaveRequestId, LeaveTypeId,
};

use super::quota;

/// A category of leave with its yearly allocation defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveType {
    /// Unique identifier.
    pub id: LeaveTypeId,
    /// Display name (e.g., "Annual leave").
    pub name: String,
    /// Days granted per year when no ledger row overrides it.
    pub default_days: i32,
    /// Whether leftover days may be carried into the following year.
    pub can_defer: bool,
}

/// Workflow status of a leave request.
///
/// Only non-rejected requests count toward consumption. Transitions beyond
/// this state machine belong to the workflow layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Submitted, awaiting a decision.
    Pending,
    /// Approved, not yet taken.
    Approved,
    /// Declined; the request no longer consumes quota.
    Rejected,
    /// Leave underway or administratively processed.
    Processed,
    /// Leave fully taken.
    Completed,
}

impl RequestStatus {
    /// Whether requests in this status consume quota.
    #[must_use]
    pub fn counts_toward_usage(self) -> bool {
        self != Self::Rejected
    }

    /// Whether a transition from `self` to `to` is allowed.
    ///
    /// pending → approved | rejected; approved → processed | completed;
    /// processed → completed. Rejected and completed are terminal. A
    /// same-status write is a no-op and always allowed.
    #[must_use]
    pub fn can_transition(self, to: Self) -> bool {
        match (self, to) {
            _ if self == to => true,
            (Self::Pending, Self::Approved | Self::Rejected)
            | (Self::Approved, Self::Processed | Self::Completed)
            | (Self::Processed, Self::Completed) => true,
            _ => false,
        }
    }
}

/// A discrete leave request drawn against an employee's quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Unique identifier.
    pub id: LeaveRequestId,
    /// The employee taking leave.
    pub employee_id: EmployeeId,
    /// The leave category consumed.
    pub leave_type_id: LeaveTypeId,
    /// First day of leave.
    pub start_date: NaiveDate,
    /// Last day of leave.
    pub end_date: NaiveDate,
    /// Working-day count of the span; absent values contribute 0.
    #[serde(default, deserialize_with = "quota::lenient_days")]
    pub days_requested: i32,
    /// Calendar year the leave is taken in. Must match `start_date`'s year;
    /// drifted rows are corrected by the period repair job.
    #[serde(default, deserialize_with = "quota::lenient_year")]
    pub leave_period: Option<i32>,
    /// Year whose quota is drawn. Lower than `leave_period` for a deferred
    /// draw; unset means the execution year.
    #[serde(default, deserialize_with = "quota::lenient_year")]
    pub leave_quota_year: Option<i32>,
    /// Workflow status.
    pub status: RequestStatus,
}

impl LeaveRequest {
    /// Days this request contributes to consumption. Missing or negative
    /// stored values contribute nothing.
    #[must_use]
    pub fn counted_days(&self) -> i32 {
        self.days_requested.max(0)
    }
}

/// Per-(employee, leave type, year) ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveBalance {
    /// Unique identifier.
    pub id: LeaveBalanceId,
    /// The employee this row belongs to.
    pub employee_id: EmployeeId,
    /// The leave category this row tracks.
    pub leave_type_id: LeaveTypeId,
    /// The quota year this row tracks.
    pub year: i32,
    /// Days granted for the year.
    #[serde(default)]
    pub total_days: i32,
    /// One-time carry-over from the prior year.
    #[serde(default)]
    pub deferred_days: i32,
    /// Current-year consumption, maintained by the reconciliation job.
    #[serde(default)]
    pub used_days: i32,
    /// Last write timestamp.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Append-only proof that `from_year`'s leftover was carried into
/// `from_year + 1`. At most one row per (employee, from_year).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeferralLog {
    /// Unique identifier.
    pub id: DeferralLogId,
    /// The employee granted the carry-over.
    pub employee_id: EmployeeId,
    /// The year whose leftover was carried forward.
    pub from_year: i32,
    /// Days carried into the following year.
    pub days: i32,
    /// When the grant was recorded.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RequestStatus::Pending, RequestStatus::Approved, true)]
    #[case(RequestStatus::Pending, RequestStatus::Rejected, true)]
    #[case(RequestStatus::Approved, RequestStatus::Processed, true)]
    #[case(RequestStatus::Approved, RequestStatus::Completed, true)]
    #[case(RequestStatus::Processed, RequestStatus::Completed, true)]
    #[case(RequestStatus::Rejected, RequestStatus::Pending, false)]
    #[case(RequestStatus::Rejected, RequestStatus::Approved, false)]
    #[case(RequestStatus::Completed, RequestStatus::Pending, false)]
    #[case(RequestStatus::Pending, RequestStatus::Completed, false)]
    fn test_status_transitions(
        #[case] from: RequestStatus,
        #[case] to: RequestStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition(to), allowed);
    }

    #[test]
    fn test_same_status_write_is_allowed() {
        assert!(RequestStatus::Rejected.can_transition(RequestStatus::Rejected));
    }

    #[test]
    fn test_only_rejected_is_excluded_from_usage() {
        assert!(RequestStatus::Pending.counts_toward_usage());
        assert!(RequestStatus::Approved.counts_toward_usage());
        assert!(RequestStatus::Processed.counts_toward_usage());
        assert!(RequestStatus::Completed.counts_toward_usage());
        assert!(!RequestStatus::Rejected.counts_toward_usage());
    }

    #[test]
    fn test_status_is_lowercase_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&RequestStatus::Approved).unwrap(),
            "\"approved\""
        );
        let back: RequestStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(back, RequestStatus::Rejected);
    }

    #[test]
    fn test_negative_stored_days_count_as_zero() {
        let json = serde_json::json!({
            "id": "00000000-0000-0000-0000-000000000001",
            "employee_id": "00000000-0000-0000-0000-000000000002",
            "leave_type_id": "00000000-0000-0000-0000-000000000003",
            "start_date": "2025-03-10",
            "end_date": "2025-03-12",
            "days_requested": -4,
            "status": "approved"
        });
        let request: LeaveRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.counted_days(), 0);
    }
}
