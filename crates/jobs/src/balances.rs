//! Read-side balance breakdowns and request verification.

use chrono::Datelike;
use tracing::debug;

use furlough_core::calendar::HolidaySet;
use furlough_core::leave::{
    self, BalanceBreakdown, LeaveRequest, LeaveType, validation,
};
use furlough_shared::types::{EmployeeId, LeaveTypeId};
use furlough_store::{HolidayProvider, LeaveStore};

use crate::context::JobContext;
use crate::error::{JobError, JobResult};

/// Computes the balance breakdown for one (employee, leave type, year).
///
/// Reads never raise consistency errors: whatever the ledger row currently
/// holds, the result is the best-known derived value. Drift is repaired by
/// the batch jobs, not here.
///
/// # Errors
///
/// Returns `NotFound` for an unknown leave type, or a store error.
pub async fn breakdown(
    ctx: &JobContext,
    employee_id: EmployeeId,
    leave_type_id: LeaveTypeId,
    year: i32,
) -> JobResult<BalanceBreakdown> {
    let leave_type = ctx
        .store
        .find_leave_type(leave_type_id)
        .await?
        .ok_or_else(|| JobError::NotFound(format!("leave type {leave_type_id}")))?;

    breakdown_for_type(ctx, employee_id, &leave_type, year).await
}

/// Computes breakdowns for every leave type independently.
///
/// # Errors
///
/// Returns the first store error encountered.
pub async fn breakdown_all(
    ctx: &JobContext,
    employee_id: EmployeeId,
    year: i32,
) -> JobResult<Vec<(LeaveType, BalanceBreakdown)>> {
    let leave_types = ctx.store.list_leave_types().await?;

    let mut results = Vec::with_capacity(leave_types.len());
    for leave_type in leave_types {
        let breakdown = breakdown_for_type(ctx, employee_id, &leave_type, year).await?;
        results.push((leave_type, breakdown));
    }
    Ok(results)
}

async fn breakdown_for_type(
    ctx: &JobContext,
    employee_id: EmployeeId,
    leave_type: &LeaveType,
    year: i32,
) -> JobResult<BalanceBreakdown> {
    let balance = ctx
        .store
        .find_balance(employee_id, leave_type.id, year)
        .await?;
    let requests = ctx
        .store
        .requests_for_period(employee_id, leave_type.id, year)
        .await?;

    let result = leave::calculate_balance(balance.as_ref(), leave_type, &requests, year);
    debug!(
        employee_id = %employee_id,
        leave_type = %leave_type.name,
        year,
        remaining = result.remaining,
        "computed balance breakdown"
    );
    Ok(result)
}

/// Verifies a request's day count and year fields against the calendar,
/// loading the holiday set for the request's execution year.
///
/// # Errors
///
/// Returns a validation error describing the first violated rule, or a
/// store error from the holiday source.
pub async fn verify_request(ctx: &JobContext, request: &LeaveRequest) -> JobResult<()> {
    let mut holidays = ctx.holidays.holidays(request.start_date.year()).await?;
    if request.end_date.year() != request.start_date.year() {
        let next_year: HolidaySet = ctx.holidays.holidays(request.end_date.year()).await?;
        holidays = holidays.iter().chain(next_year.iter()).collect();
    }

    validation::validate_request(request, &holidays)?;
    Ok(())
}
