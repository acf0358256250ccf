//! The typed store contract consumed by services and batch jobs.

use async_trait::async_trait;
use chrono::NaiveDate;

use furlough_core::leave::{DeferralLog, LeaveBalance, LeaveRequest, LeaveType};
use furlough_shared::types::{
    EmployeeId, LeaveBalanceId, LeaveRequestId, LeaveTypeId, PageRequest,
};

use crate::error::StoreResult;

/// Typed operations over the remote row-store tables.
///
/// Paged scans are ordered by row id (time-ordered UUIDs), so a page number
/// identifies a stable slice and failed batch runs can resume from an
/// explicit page.
#[async_trait]
pub trait LeaveStore: Send + Sync {
    /// Lists every leave type.
    async fn list_leave_types(&self) -> StoreResult<Vec<LeaveType>>;

    /// Looks up one leave type.
    async fn find_leave_type(&self, id: LeaveTypeId) -> StoreResult<Option<LeaveType>>;

    /// Reads one page of leave requests, ordered by id.
    async fn leave_requests_page(&self, page: PageRequest) -> StoreResult<Vec<LeaveRequest>>;

    /// Reads every request of one employee and leave type stored under the
    /// given period year.
    async fn requests_for_period(
        &self,
        employee_id: EmployeeId,
        leave_type_id: LeaveTypeId,
        period: i32,
    ) -> StoreResult<Vec<LeaveRequest>>;

    /// Rewrites a request's stored period year.
    async fn set_request_period(&self, id: LeaveRequestId, period: i32) -> StoreResult<()>;

    /// Reads one page of balance ledger rows, ordered by id.
    async fn leave_balances_page(&self, page: PageRequest) -> StoreResult<Vec<LeaveBalance>>;

    /// Reads every balance ledger row for a year.
    async fn balances_for_year(&self, year: i32) -> StoreResult<Vec<LeaveBalance>>;

    /// Looks up the ledger row for one (employee, leave type, year).
    async fn find_balance(
        &self,
        employee_id: EmployeeId,
        leave_type_id: LeaveTypeId,
        year: i32,
    ) -> StoreResult<Option<LeaveBalance>>;

    /// Inserts a new ledger row.
    async fn insert_balance(&self, balance: LeaveBalance) -> StoreResult<LeaveBalance>;

    /// Rewrites a ledger row's current-year consumption.
    async fn set_used_days(&self, id: LeaveBalanceId, days: i32) -> StoreResult<()>;

    /// Rewrites a ledger row's carried-over pool.
    async fn set_deferred_days(&self, id: LeaveBalanceId, days: i32) -> StoreResult<()>;

    /// Looks up the deferral proof for one (employee, from-year).
    async fn find_deferral(
        &self,
        employee_id: EmployeeId,
        from_year: i32,
    ) -> StoreResult<Option<DeferralLog>>;

    /// Inserts a deferral proof.
    ///
    /// This is an atomic insert-if-absent on (employee, from-year): a
    /// concurrent duplicate must surface as [`StoreError::Conflict`], never
    /// silently overwrite.
    ///
    /// [`StoreError::Conflict`]: crate::error::StoreError::Conflict
    async fn insert_deferral(&self, log: DeferralLog) -> StoreResult<DeferralLog>;

    /// Distinct employees observed across balances and requests.
    async fn known_employee_ids(&self) -> StoreResult<Vec<EmployeeId>>;

    /// Holiday dates recorded for a year in the `national_holidays` table.
    async fn holidays_for_year(&self, year: i32) -> StoreResult<Vec<NaiveDate>>;
}
