//! Interchangeable holiday sources.
//!
//! The calendar only needs a per-year set of dates; whether it comes from
//! the `national_holidays` table or an external holiday API is a deployment
//! choice.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use furlough_core::calendar::HolidaySet;

use crate::error::{StoreError, StoreResult};
use crate::store::LeaveStore;

/// A per-year supplier of holiday dates.
#[async_trait]
pub trait HolidayProvider: Send + Sync {
    /// Returns the holiday set for a calendar year.
    async fn holidays(&self, year: i32) -> StoreResult<HolidaySet>;
}

/// Holidays read from the row-store's `national_holidays` table.
pub struct TableHolidays {
    store: Arc<dyn LeaveStore>,
}

impl TableHolidays {
    /// Wraps a store handle.
    #[must_use]
    pub fn new(store: Arc<dyn LeaveStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HolidayProvider for TableHolidays {
    async fn holidays(&self, year: i32) -> StoreResult<HolidaySet> {
        let dates = self.store.holidays_for_year(year).await?;
        Ok(dates.into_iter().collect())
    }
}

#[derive(Deserialize)]
struct HolidayApiRow {
    holiday_date: NaiveDate,
}

/// Holidays fetched from an external per-year API returning
/// `[{"holiday_date": "YYYY-MM-DD"}]`.
pub struct ApiHolidays {
    client: reqwest::Client,
    url: String,
}

impl ApiHolidays {
    /// Builds a provider against the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(url: &str, timeout_secs: u64) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|err| StoreError::Backend {
                operation: "holiday client init".to_string(),
                message: err.to_string(),
            })?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl HolidayProvider for ApiHolidays {
    async fn holidays(&self, year: i32) -> StoreResult<HolidaySet> {
        let operation = format!("holiday fetch for {year}");
        debug!(year, "fetching holiday year from external API");

        let response = self
            .client
            .get(&self.url)
            .query(&[("year", year)])
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    StoreError::Timeout {
                        operation: operation.clone(),
                    }
                } else {
                    StoreError::Backend {
                        operation: operation.clone(),
                        message: err.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(StoreError::Backend {
                operation,
                message: format!("status {}", response.status()),
            });
        }

        let rows = response
            .json::<Vec<HolidayApiRow>>()
            .await
            .map_err(|err| StoreError::Decode {
                table: "holiday api",
                message: err.to_string(),
            })?;

        Ok(rows.into_iter().map(|row| row.holiday_date).collect())
    }
}

/// A fixed holiday table for tests and offline runs.
#[derive(Default)]
pub struct StaticHolidays {
    by_year: HashMap<i32, Vec<NaiveDate>>,
}

impl StaticHolidays {
    /// Creates an empty provider (every year has no holidays).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds holidays for a year.
    #[must_use]
    pub fn with_year(mut self, year: i32, dates: Vec<NaiveDate>) -> Self {
        self.by_year.insert(year, dates);
        self
    }
}

#[async_trait]
impl HolidayProvider for StaticHolidays {
    async fn holidays(&self, year: i32) -> StoreResult<HolidaySet> {
        Ok(self
            .by_year
            .get(&year)
            .into_iter()
            .flatten()
            .copied()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_table_holidays_are_scoped_to_the_year() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_holiday(date(2025, 1, 1));
        store.seed_holiday(date(2025, 12, 25));
        store.seed_holiday(date(2026, 1, 1));

        let provider = TableHolidays::new(store);
        let set = provider.holidays(2025).await.unwrap();

        assert_eq!(set.len(), 2);
        assert!(set.contains(date(2025, 12, 25)));
        assert!(!set.contains(date(2026, 1, 1)));
    }

    #[tokio::test]
    async fn test_static_holidays_default_to_empty() {
        let provider = StaticHolidays::new().with_year(2025, vec![date(2025, 5, 1)]);

        assert_eq!(provider.holidays(2025).await.unwrap().len(), 1);
        assert!(provider.holidays(2024).await.unwrap().is_empty());
    }
}
