//! In-memory store for unit and integration tests.
//!
//! Holds the five tables behind one mutex, so `insert_deferral`'s
//! check-then-insert is atomic the same way the production store's unique
//! key is. Individual balance rows can be marked as failing to exercise the
//! batch jobs' skip-and-continue paths.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};

use furlough_core::leave::{DeferralLog, LeaveBalance, LeaveRequest, LeaveType};
use furlough_shared::types::{
    EmployeeId, LeaveBalanceId, LeaveRequestId, LeaveTypeId, PageRequest,
};

use crate::error::{StoreError, StoreResult};
use crate::store::LeaveStore;

#[derive(Default)]
struct Tables {
    leave_types: Vec<LeaveType>,
    requests: Vec<LeaveRequest>,
    balances: Vec<LeaveBalance>,
    deferrals: Vec<DeferralLog>,
    holidays: Vec<NaiveDate>,
}

/// An in-memory [`LeaveStore`] implementation.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    failing_balances: Mutex<HashSet<LeaveBalanceId>>,
    failing_balance_pages: Mutex<HashSet<u32>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::Backend {
            operation: "in-memory lock".to_string(),
            message: "table mutex poisoned".to_string(),
        })
    }

    fn failing(&self) -> StoreResult<MutexGuard<'_, HashSet<LeaveBalanceId>>> {
        self.failing_balances.lock().map_err(|_| StoreError::Backend {
            operation: "in-memory lock".to_string(),
            message: "failure-set mutex poisoned".to_string(),
        })
    }

    /// Seeds a leave type.
    ///
    /// # Panics
    ///
    /// Panics if the table mutex is poisoned; acceptable in test fixtures.
    pub fn seed_leave_type(&self, leave_type: LeaveType) {
        self.tables.lock().unwrap().leave_types.push(leave_type);
    }

    /// Seeds a leave request.
    ///
    /// # Panics
    ///
    /// Panics if the table mutex is poisoned; acceptable in test fixtures.
    pub fn seed_request(&self, request: LeaveRequest) {
        self.tables.lock().unwrap().requests.push(request);
    }

    /// Seeds a balance ledger row.
    ///
    /// # Panics
    ///
    /// Panics if the table mutex is poisoned; acceptable in test fixtures.
    pub fn seed_balance(&self, balance: LeaveBalance) {
        self.tables.lock().unwrap().balances.push(balance);
    }

    /// Seeds a deferral log row.
    ///
    /// # Panics
    ///
    /// Panics if the table mutex is poisoned; acceptable in test fixtures.
    pub fn seed_deferral(&self, log: DeferralLog) {
        self.tables.lock().unwrap().deferrals.push(log);
    }

    /// Seeds a holiday date.
    ///
    /// # Panics
    ///
    /// Panics if the table mutex is poisoned; acceptable in test fixtures.
    pub fn seed_holiday(&self, date: NaiveDate) {
        self.tables.lock().unwrap().holidays.push(date);
    }

    /// Makes every write to the given balance row fail with a backend error.
    ///
    /// # Panics
    ///
    /// Panics if the failure-set mutex is poisoned; acceptable in test
    /// fixtures.
    pub fn fail_writes_for(&self, id: LeaveBalanceId) {
        self.failing_balances.lock().unwrap().insert(id);
    }

    /// Makes reads of the given balance page number fail with a backend
    /// error.
    ///
    /// # Panics
    ///
    /// Panics if the failure-set mutex is poisoned; acceptable in test
    /// fixtures.
    pub fn fail_balances_page(&self, page: u32) {
        self.failing_balance_pages.lock().unwrap().insert(page);
    }

    /// Returns a copy of the stored request, if present.
    ///
    /// # Panics
    ///
    /// Panics if the table mutex is poisoned; acceptable in test fixtures.
    #[must_use]
    pub fn request(&self, id: LeaveRequestId) -> Option<LeaveRequest> {
        self.tables
            .lock()
            .unwrap()
            .requests
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Returns a copy of the stored balance row, if present.
    ///
    /// # Panics
    ///
    /// Panics if the table mutex is poisoned; acceptable in test fixtures.
    #[must_use]
    pub fn balance(&self, id: LeaveBalanceId) -> Option<LeaveBalance> {
        self.tables
            .lock()
            .unwrap()
            .balances
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }

    fn check_writable(&self, id: LeaveBalanceId) -> StoreResult<()> {
        if self.failing()?.contains(&id) {
            return Err(StoreError::Backend {
                operation: "leave_balances update".to_string(),
                message: format!("injected failure for {id}"),
            });
        }
        Ok(())
    }
}

fn page_slice<T: Clone>(mut rows: Vec<T>, page: PageRequest, key: impl Fn(&T) -> uuid::Uuid) -> Vec<T> {
    rows.sort_by_key(|row| key(row));
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl LeaveStore for InMemoryStore {
    async fn list_leave_types(&self) -> StoreResult<Vec<LeaveType>> {
        Ok(self.tables()?.leave_types.clone())
    }

    async fn find_leave_type(&self, id: LeaveTypeId) -> StoreResult<Option<LeaveType>> {
        Ok(self
            .tables()?
            .leave_types
            .iter()
            .find(|lt| lt.id == id)
            .cloned())
    }

    async fn leave_requests_page(&self, page: PageRequest) -> StoreResult<Vec<LeaveRequest>> {
        let rows = self.tables()?.requests.clone();
        Ok(page_slice(rows, page, |r| r.id.into_inner()))
    }

    async fn requests_for_period(
        &self,
        employee_id: EmployeeId,
        leave_type_id: LeaveTypeId,
        period: i32,
    ) -> StoreResult<Vec<LeaveRequest>> {
        // Equality filter on the stored column, like the remote store:
        // rows with an unset period never match until the repair job
        // converges them.
        Ok(self
            .tables()?
            .requests
            .iter()
            .filter(|r| {
                r.employee_id == employee_id
                    && r.leave_type_id == leave_type_id
                    && r.leave_period == Some(period)
            })
            .cloned()
            .collect())
    }

    async fn set_request_period(&self, id: LeaveRequestId, period: i32) -> StoreResult<()> {
        let mut tables = self.tables()?;
        let request = tables
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound {
                table: "leave_requests",
                detail: id.to_string(),
            })?;
        request.leave_period = Some(period);
        Ok(())
    }

    async fn leave_balances_page(&self, page: PageRequest) -> StoreResult<Vec<LeaveBalance>> {
        let failing = self.failing_balance_pages.lock().map_err(|_| {
            StoreError::Backend {
                operation: "in-memory lock".to_string(),
                message: "failure-set mutex poisoned".to_string(),
            }
        })?;
        if failing.contains(&page.page) {
            return Err(StoreError::Backend {
                operation: "leave_balances select".to_string(),
                message: format!("injected failure for page {}", page.page),
            });
        }
        drop(failing);

        let rows = self.tables()?.balances.clone();
        Ok(page_slice(rows, page, |b| b.id.into_inner()))
    }

    async fn balances_for_year(&self, year: i32) -> StoreResult<Vec<LeaveBalance>> {
        Ok(self
            .tables()?
            .balances
            .iter()
            .filter(|b| b.year == year)
            .cloned()
            .collect())
    }

    async fn find_balance(
        &self,
        employee_id: EmployeeId,
        leave_type_id: LeaveTypeId,
        year: i32,
    ) -> StoreResult<Option<LeaveBalance>> {
        Ok(self
            .tables()?
            .balances
            .iter()
            .find(|b| {
                b.employee_id == employee_id && b.leave_type_id == leave_type_id && b.year == year
            })
            .cloned())
    }

    async fn insert_balance(&self, balance: LeaveBalance) -> StoreResult<LeaveBalance> {
        let mut tables = self.tables()?;
        let duplicate = tables.balances.iter().any(|b| {
            b.employee_id == balance.employee_id
                && b.leave_type_id == balance.leave_type_id
                && b.year == balance.year
        });
        if duplicate {
            return Err(StoreError::Conflict {
                table: "leave_balances",
                detail: format!(
                    "{}/{}/{}",
                    balance.employee_id, balance.leave_type_id, balance.year
                ),
            });
        }
        tables.balances.push(balance.clone());
        Ok(balance)
    }

    async fn set_used_days(&self, id: LeaveBalanceId, days: i32) -> StoreResult<()> {
        self.check_writable(id)?;
        let mut tables = self.tables()?;
        let balance = tables
            .balances
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| StoreError::NotFound {
                table: "leave_balances",
                detail: id.to_string(),
            })?;
        balance.used_days = days;
        balance.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn set_deferred_days(&self, id: LeaveBalanceId, days: i32) -> StoreResult<()> {
        self.check_writable(id)?;
        let mut tables = self.tables()?;
        let balance = tables
            .balances
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| StoreError::NotFound {
                table: "leave_balances",
                detail: id.to_string(),
            })?;
        balance.deferred_days = days;
        balance.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn find_deferral(
        &self,
        employee_id: EmployeeId,
        from_year: i32,
    ) -> StoreResult<Option<DeferralLog>> {
        Ok(self
            .tables()?
            .deferrals
            .iter()
            .find(|d| d.employee_id == employee_id && d.from_year == from_year)
            .cloned())
    }

    async fn insert_deferral(&self, log: DeferralLog) -> StoreResult<DeferralLog> {
        // Check and insert under one lock: the unique-key guard.
        let mut tables = self.tables()?;
        let duplicate = tables
            .deferrals
            .iter()
            .any(|d| d.employee_id == log.employee_id && d.from_year == log.from_year);
        if duplicate {
            return Err(StoreError::Conflict {
                table: "leave_deferrals",
                detail: format!("{}/{}", log.employee_id, log.from_year),
            });
        }
        tables.deferrals.push(log.clone());
        Ok(log)
    }

    async fn known_employee_ids(&self) -> StoreResult<Vec<EmployeeId>> {
        let tables = self.tables()?;
        let ids: BTreeSet<EmployeeId> = tables
            .balances
            .iter()
            .map(|b| b.employee_id)
            .chain(tables.requests.iter().map(|r| r.employee_id))
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn holidays_for_year(&self, year: i32) -> StoreResult<Vec<NaiveDate>> {
        Ok(self
            .tables()?
            .holidays
            .iter()
            .filter(|d| d.year() == year)
            .copied()
            .collect())
    }
}
