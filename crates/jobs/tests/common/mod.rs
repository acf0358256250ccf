//! Shared fixtures for the job integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;

use furlough_core::leave::{DeferralLog, LeaveBalance, LeaveRequest, LeaveType, RequestStatus};
use furlough_jobs::JobContext;
use furlough_shared::types::{
    DeferralLogId, EmployeeId, LeaveBalanceId, LeaveRequestId, LeaveTypeId,
};
use furlough_store::holidays::StaticHolidays;
use furlough_store::memory::InMemoryStore;

/// Builds a context over the given store with a deliberately small page
/// size so multi-page paths run even in small fixtures.
pub fn ctx(store: Arc<InMemoryStore>) -> JobContext {
    JobContext::new(store, Arc::new(StaticHolidays::new()), 2)
}

pub fn annual_type() -> LeaveType {
    LeaveType {
        id: LeaveTypeId::new(),
        name: "Annual leave".to_string(),
        default_days: 20,
        can_defer: true,
    }
}

pub fn sick_type() -> LeaveType {
    LeaveType {
        id: LeaveTypeId::new(),
        name: "Sick leave".to_string(),
        default_days: 10,
        can_defer: false,
    }
}

pub fn balance(
    employee_id: EmployeeId,
    leave_type: &LeaveType,
    year: i32,
    total: i32,
    deferred: i32,
    used: i32,
) -> LeaveBalance {
    LeaveBalance {
        id: LeaveBalanceId::new(),
        employee_id,
        leave_type_id: leave_type.id,
        year,
        total_days: total,
        deferred_days: deferred,
        used_days: used,
        updated_at: None,
    }
}

pub fn request(
    employee_id: EmployeeId,
    leave_type: &LeaveType,
    start: &str,
    days: i32,
    period: Option<i32>,
    quota_year: Option<i32>,
    status: RequestStatus,
) -> LeaveRequest {
    let start_date: NaiveDate = start.parse().unwrap();
    LeaveRequest {
        id: LeaveRequestId::new(),
        employee_id,
        leave_type_id: leave_type.id,
        start_date,
        end_date: start_date + chrono::Duration::days(i64::from(days.max(1)) - 1),
        days_requested: days,
        leave_period: period,
        leave_quota_year: quota_year,
        status,
    }
}

pub fn deferral(employee_id: EmployeeId, from_year: i32, days: i32) -> DeferralLog {
    DeferralLog {
        id: DeferralLogId::new(),
        employee_id,
        from_year,
        days,
        created_at: None,
    }
}
