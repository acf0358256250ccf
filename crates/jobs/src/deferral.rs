//! One-time carry-over grants.

use chrono::Utc;
use tracing::info;

use furlough_core::leave::{DeferralLog, LeaveBalance, LeaveError};
use furlough_shared::types::{DeferralLogId, EmployeeId, LeaveBalanceId, LeaveTypeId};
use furlough_store::{LeaveStore, StoreError};

use crate::context::JobContext;
use crate::error::{JobError, JobResult};

/// Carries `days` of `from_year`'s leftover into the following year's
/// deferred pool.
///
/// The log insert rides the store's unique (employee, from-year) key, so it
/// happens before any balance mutation: a duplicate grant fails with
/// `AlreadyDeferred` and leaves the target row untouched. The target ledger
/// row is created from the leave type's defaults when absent.
///
/// # Errors
///
/// - `Validation` for a non-positive day count or a leave type that does not
///   allow carry-over
/// - `NotFound` for an unknown leave type
/// - `AlreadyDeferred` when a grant for (employee, from-year) exists
/// - `Store` on backend failure
pub async fn grant(
    ctx: &JobContext,
    employee_id: EmployeeId,
    leave_type_id: LeaveTypeId,
    from_year: i32,
    days: i32,
) -> JobResult<DeferralLog> {
    if days <= 0 {
        return Err(LeaveError::InvalidDays(days).into());
    }

    let leave_type = ctx
        .store
        .find_leave_type(leave_type_id)
        .await?
        .ok_or_else(|| JobError::NotFound(format!("leave type {leave_type_id}")))?;
    if !leave_type.can_defer {
        return Err(LeaveError::DeferralNotAllowed(leave_type.name).into());
    }

    let log = DeferralLog {
        id: DeferralLogId::new(),
        employee_id,
        from_year,
        days,
        created_at: Some(Utc::now()),
    };
    let log = match ctx.store.insert_deferral(log).await {
        Ok(log) => log,
        Err(StoreError::Conflict { .. }) => {
            return Err(JobError::AlreadyDeferred {
                employee_id,
                from_year,
            });
        }
        Err(err) => return Err(err.into()),
    };

    let target_year = from_year + 1;
    let balance = match ctx
        .store
        .find_balance(employee_id, leave_type_id, target_year)
        .await?
    {
        Some(balance) => balance,
        None => {
            ctx.store
                .insert_balance(LeaveBalance {
                    id: LeaveBalanceId::new(),
                    employee_id,
                    leave_type_id,
                    year: target_year,
                    total_days: leave_type.default_days,
                    deferred_days: 0,
                    used_days: 0,
                    updated_at: Some(Utc::now()),
                })
                .await?
        }
    };

    ctx.store.set_deferred_days(balance.id, days).await?;

    info!(
        employee_id = %employee_id,
        from_year,
        days,
        "granted carry-over into {target_year}"
    );
    Ok(log)
}
