//! Quota-year resolution.
//!
//! Two facts classify every request: `start_date` is authoritative for the
//! execution year (the stored `leave_period` is repaired toward it, never the
//! reverse), and `leave_quota_year` alone decides which year's pool a request
//! draws from.

use chrono::Datelike;
use serde::{Deserialize, Deserializer};

use super::types::LeaveRequest;

/// The calendar year the leave is physically taken, derived from
/// `start_date`.
#[must_use]
pub fn execution_year(request: &LeaveRequest) -> i32 {
    request.start_date.year()
}

/// The period used for classification: the stored `leave_period` when set,
/// otherwise the execution year.
#[must_use]
pub fn effective_period(request: &LeaveRequest) -> i32 {
    request.leave_period.unwrap_or_else(|| execution_year(request))
}

/// The year whose quota this request draws against.
///
/// `leave_quota_year` counts only when it is lower than the effective period
/// (a deferred draw); unset or ahead-of-period values resolve to the period
/// itself.
#[must_use]
pub fn usage_year(request: &LeaveRequest) -> i32 {
    let period = effective_period(request);
    match request.leave_quota_year {
        Some(quota_year) if quota_year < period => quota_year,
        _ => period,
    }
}

/// Returns true when the request consumes a prior year's carried-over pool.
#[must_use]
pub fn is_deferred_draw(request: &LeaveRequest) -> bool {
    usage_year(request) < effective_period(request)
}

/// Returns the corrected period when the stored `leave_period` disagrees
/// with `start_date`, or `None` when the row is consistent.
#[must_use]
pub fn period_mismatch(request: &LeaveRequest) -> Option<i32> {
    let derived = execution_year(request);
    (request.leave_period != Some(derived)).then_some(derived)
}

/// Raw year value as it may appear in stored rows.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawYear {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Deserializes a year column that may hold an integer, a numeric string, or
/// null. Null and unparseable values become `None`.
pub fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawYear>::deserialize(deserializer)?;
    Ok(raw.and_then(normalize_year))
}

#[allow(clippy::float_arithmetic, clippy::cast_possible_truncation)]
fn normalize_year(raw: RawYear) -> Option<i32> {
    match raw {
        RawYear::Int(value) => i32::try_from(value).ok(),
        RawYear::Float(value) if value.is_finite() && value.fract() == 0.0 => {
            i32::try_from(value as i64).ok()
        }
        RawYear::Float(_) => None,
        RawYear::Text(text) => text.trim().parse::<i32>().ok(),
    }
}

/// Deserializes a day-count column; null or missing values become 0.
pub fn lenient_days<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i32>::deserialize(deserializer)?.unwrap_or(0))
}
