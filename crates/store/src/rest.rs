//! REST client for the remote row-store.
//!
//! The store speaks a filtered-rows dialect: `GET /{table}?col=eq.v` with a
//! `Range` header for pagination, `POST` for inserts (returning the stored
//! representation), and `PATCH` with the same filters for updates. Every
//! call carries the configured timeout and a bounded retry budget; a
//! unique-key rejection surfaces as [`StoreError::Conflict`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use furlough_core::leave::{DeferralLog, LeaveBalance, LeaveRequest, LeaveType};
use furlough_shared::config::StoreConfig;
use furlough_shared::types::{
    EmployeeId, LeaveBalanceId, LeaveRequestId, LeaveTypeId, PageRequest,
};

use crate::error::{StoreError, StoreResult};
use crate::store::LeaveStore;

const LEAVE_TYPES: &str = "leave_types";
const LEAVE_REQUESTS: &str = "leave_requests";
const LEAVE_BALANCES: &str = "leave_balances";
const LEAVE_DEFERRALS: &str = "leave_deferrals";
const NATIONAL_HOLIDAYS: &str = "national_holidays";

/// A [`LeaveStore`] talking to the remote row-store endpoint.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_retries: u32,
}

impl RestStore {
    /// Builds a client from the store configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| StoreError::Backend {
                operation: "client init".to_string(),
                message: err.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{table}", self.base_url)
    }

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("apikey", key),
            None => builder,
        }
    }

    async fn send_with_retry(
        &self,
        operation: &str,
        builder: reqwest::RequestBuilder,
    ) -> StoreResult<reqwest::Response> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let request = builder.try_clone().ok_or_else(|| StoreError::Backend {
                operation: operation.to_string(),
                message: "request body is not replayable".to_string(),
            })?;

            match request.send().await {
                Ok(response) if response.status().is_server_error() => {
                    if attempt > self.max_retries {
                        return Err(StoreError::Backend {
                            operation: operation.to_string(),
                            message: format!("status {}", response.status()),
                        });
                    }
                    warn!(operation, attempt, status = %response.status(), "retrying row-store call");
                }
                Ok(response) => return Ok(response),
                Err(err) if err.is_timeout() => {
                    if attempt > self.max_retries {
                        return Err(StoreError::Timeout {
                            operation: operation.to_string(),
                        });
                    }
                    warn!(operation, attempt, "row-store call timed out, retrying");
                }
                Err(err) if err.is_connect() && attempt <= self.max_retries => {
                    warn!(operation, attempt, error = %err, "row-store unreachable, retrying");
                }
                Err(err) => {
                    return Err(StoreError::Backend {
                        operation: operation.to_string(),
                        message: err.to_string(),
                    });
                }
            }

            tokio::time::sleep(backoff(attempt)).await;
        }
    }

    async fn expect_success(
        response: reqwest::Response,
        table: &'static str,
        operation: &str,
    ) -> StoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT {
            return Err(StoreError::Conflict {
                table,
                detail: message,
            });
        }
        Err(StoreError::Backend {
            operation: operation.to_string(),
            message: format!("status {status}: {message}"),
        })
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &'static str,
        query: &[(&str, String)],
        page: Option<PageRequest>,
    ) -> StoreResult<Vec<T>> {
        let operation = format!("{table} select");
        debug!(table, ?page, "row-store select");

        let mut builder = self.apply_auth(self.client.get(self.table_url(table)).query(query));
        if let Some(page) = page {
            builder = builder.header("Range-Unit", "items").header(
                "Range",
                range_header(page.offset(), page.limit()),
            );
        }

        let response = self.send_with_retry(&operation, builder).await?;
        let response = Self::expect_success(response, table, &operation).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|err| StoreError::Decode {
                table,
                message: err.to_string(),
            })
    }

    async fn first_row<T: DeserializeOwned>(
        &self,
        table: &'static str,
        query: &[(&str, String)],
    ) -> StoreResult<Option<T>> {
        let mut rows = self.get_rows::<T>(table, query, None).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    async fn insert_row<T: serde::Serialize + DeserializeOwned>(
        &self,
        table: &'static str,
        row: &T,
    ) -> StoreResult<T> {
        let operation = format!("{table} insert");
        debug!(table, "row-store insert");

        let builder = self
            .apply_auth(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(row);

        let response = self.send_with_retry(&operation, builder).await?;
        let response = Self::expect_success(response, table, &operation).await?;
        let mut rows = response
            .json::<Vec<T>>()
            .await
            .map_err(|err| StoreError::Decode {
                table,
                message: err.to_string(),
            })?;
        if rows.is_empty() {
            return Err(StoreError::Backend {
                operation,
                message: "insert returned no representation".to_string(),
            });
        }
        Ok(rows.swap_remove(0))
    }

    async fn patch_rows(
        &self,
        table: &'static str,
        query: &[(&str, String)],
        patch: &serde_json::Value,
    ) -> StoreResult<()> {
        let operation = format!("{table} update");
        debug!(table, "row-store update");

        let builder = self
            .apply_auth(self.client.patch(self.table_url(table)).query(query))
            .json(patch);

        let response = self.send_with_retry(&operation, builder).await?;
        Self::expect_success(response, table, &operation).await?;
        Ok(())
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(200 * u64::from(attempt))
}

fn eq<T: std::fmt::Display>(value: T) -> String {
    format!("eq.{value}")
}

fn range_header(offset: u64, limit: u64) -> String {
    let end = offset + limit.max(1) - 1;
    format!("{offset}-{end}")
}

#[derive(Deserialize)]
struct EmployeeRef {
    employee_id: EmployeeId,
}

#[derive(Deserialize)]
struct HolidayRow {
    holiday_date: NaiveDate,
}

#[async_trait]
impl LeaveStore for RestStore {
    async fn list_leave_types(&self) -> StoreResult<Vec<LeaveType>> {
        self.get_rows(LEAVE_TYPES, &[("order", "id.asc".to_string())], None)
            .await
    }

    async fn find_leave_type(&self, id: LeaveTypeId) -> StoreResult<Option<LeaveType>> {
        self.first_row(LEAVE_TYPES, &[("id", eq(id))]).await
    }

    async fn leave_requests_page(&self, page: PageRequest) -> StoreResult<Vec<LeaveRequest>> {
        self.get_rows(
            LEAVE_REQUESTS,
            &[("order", "id.asc".to_string())],
            Some(page),
        )
        .await
    }

    async fn requests_for_period(
        &self,
        employee_id: EmployeeId,
        leave_type_id: LeaveTypeId,
        period: i32,
    ) -> StoreResult<Vec<LeaveRequest>> {
        self.get_rows(
            LEAVE_REQUESTS,
            &[
                ("employee_id", eq(employee_id)),
                ("leave_type_id", eq(leave_type_id)),
                ("leave_period", eq(period)),
            ],
            None,
        )
        .await
    }

    async fn set_request_period(&self, id: LeaveRequestId, period: i32) -> StoreResult<()> {
        self.patch_rows(
            LEAVE_REQUESTS,
            &[("id", eq(id))],
            &serde_json::json!({ "leave_period": period }),
        )
        .await
    }

    async fn leave_balances_page(&self, page: PageRequest) -> StoreResult<Vec<LeaveBalance>> {
        self.get_rows(
            LEAVE_BALANCES,
            &[("order", "id.asc".to_string())],
            Some(page),
        )
        .await
    }

    async fn balances_for_year(&self, year: i32) -> StoreResult<Vec<LeaveBalance>> {
        self.get_rows(LEAVE_BALANCES, &[("year", eq(year))], None).await
    }

    async fn find_balance(
        &self,
        employee_id: EmployeeId,
        leave_type_id: LeaveTypeId,
        year: i32,
    ) -> StoreResult<Option<LeaveBalance>> {
        self.first_row(
            LEAVE_BALANCES,
            &[
                ("employee_id", eq(employee_id)),
                ("leave_type_id", eq(leave_type_id)),
                ("year", eq(year)),
            ],
        )
        .await
    }

    async fn insert_balance(&self, balance: LeaveBalance) -> StoreResult<LeaveBalance> {
        self.insert_row(LEAVE_BALANCES, &balance).await
    }

    async fn set_used_days(&self, id: LeaveBalanceId, days: i32) -> StoreResult<()> {
        self.patch_rows(
            LEAVE_BALANCES,
            &[("id", eq(id))],
            &serde_json::json!({
                "used_days": days,
                "updated_at": Utc::now().to_rfc3339(),
            }),
        )
        .await
    }

    async fn set_deferred_days(&self, id: LeaveBalanceId, days: i32) -> StoreResult<()> {
        self.patch_rows(
            LEAVE_BALANCES,
            &[("id", eq(id))],
            &serde_json::json!({
                "deferred_days": days,
                "updated_at": Utc::now().to_rfc3339(),
            }),
        )
        .await
    }

    async fn find_deferral(
        &self,
        employee_id: EmployeeId,
        from_year: i32,
    ) -> StoreResult<Option<DeferralLog>> {
        self.first_row(
            LEAVE_DEFERRALS,
            &[("employee_id", eq(employee_id)), ("from_year", eq(from_year))],
        )
        .await
    }

    async fn insert_deferral(&self, log: DeferralLog) -> StoreResult<DeferralLog> {
        // The table's unique (employee_id, from_year) key makes this an
        // atomic insert-if-absent; duplicates come back as Conflict.
        self.insert_row(LEAVE_DEFERRALS, &log).await
    }

    async fn known_employee_ids(&self) -> StoreResult<Vec<EmployeeId>> {
        let select = [("select", "employee_id".to_string())];
        let from_balances = self
            .get_rows::<EmployeeRef>(LEAVE_BALANCES, &select, None)
            .await?;
        let from_requests = self
            .get_rows::<EmployeeRef>(LEAVE_REQUESTS, &select, None)
            .await?;

        let ids: std::collections::BTreeSet<EmployeeId> = from_balances
            .into_iter()
            .chain(from_requests)
            .map(|row| row.employee_id)
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn holidays_for_year(&self, year: i32) -> StoreResult<Vec<NaiveDate>> {
        let rows = self
            .get_rows::<HolidayRow>(
                NATIONAL_HOLIDAYS,
                &[
                    ("holiday_date", format!("gte.{year}-01-01")),
                    ("holiday_date", format!("lte.{year}-12-31")),
                ],
                None,
            )
            .await?;
        Ok(rows.into_iter().map(|row| row.holiday_date).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 200, "0-199")]
    #[case(200, 200, "200-399")]
    #[case(0, 1, "0-0")]
    #[case(10, 0, "10-10")]
    fn test_range_header(#[case] offset: u64, #[case] limit: u64, #[case] expected: &str) {
        assert_eq!(range_header(offset, limit), expected);
    }

    #[test]
    fn test_eq_filter_rendering() {
        assert_eq!(eq(2025), "eq.2025");
        let id = LeaveTypeId::from_uuid(uuid::Uuid::nil());
        assert_eq!(eq(id), "eq.00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let store = RestStore::new(&StoreConfig {
            url: "http://localhost:54321/rest/v1/".to_string(),
            api_key: None,
            timeout_secs: 5,
            max_retries: 2,
        })
        .unwrap();
        assert_eq!(
            store.table_url("leave_types"),
            "http://localhost:54321/rest/v1/leave_types"
        );
    }

    #[test]
    fn test_backoff_grows_linearly() {
        assert_eq!(backoff(1), Duration::from_millis(200));
        assert_eq!(backoff(3), Duration::from_millis(600));
    }
}
