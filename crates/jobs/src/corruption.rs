//! Detection and repair of deferred balances without an audit trail.
//!
//! A ledger row's `deferred_days` is only legitimate when a deferral log row
//! proves the carry-over from the prior year. Rows that hold a positive pool
//! with no such proof are the corruption this module exists for.

use serde::Serialize;
use tracing::{info, warn};

use furlough_core::leave::LeaveBalance;
use furlough_store::LeaveStore;

use crate::context::JobContext;
use crate::error::JobResult;

/// Counters reported by a corruption scan/repair run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CorruptionReport {
    /// Ledger rows examined in the target year.
    pub scanned: u64,
    /// Rows holding a deferred pool with no supporting log entry.
    pub flagged: u64,
    /// Flagged rows whose pool was reset to zero.
    pub repaired: u64,
    /// Flagged rows skipped after a store failure.
    pub failed: u64,
}

/// Finds ledger rows in `year` whose positive `deferred_days` has no
/// deferral log entry for `year - 1`.
///
/// # Errors
///
/// Returns a store error when the year scan or a log lookup fails.
pub async fn find_corrupted(ctx: &JobContext, year: i32) -> JobResult<Vec<LeaveBalance>> {
    let rows = ctx.store.balances_for_year(year).await?;

    let mut corrupted = Vec::new();
    for row in rows {
        if row.deferred_days <= 0 {
            continue;
        }
        if ctx
            .store
            .find_deferral(row.employee_id, year - 1)
            .await?
            .is_none()
        {
            corrupted.push(row);
        }
    }
    Ok(corrupted)
}

/// Resets `deferred_days` to zero on every corrupted row in `year`.
///
/// Rows with a matching log entry are untouched. Per-row write failures are
/// logged, counted, and skipped.
///
/// # Errors
///
/// Returns a store error when the scan itself fails.
pub async fn repair_corrupted(ctx: &JobContext, year: i32) -> JobResult<CorruptionReport> {
    let rows = ctx.store.balances_for_year(year).await?;

    let mut report = CorruptionReport {
        scanned: rows.len() as u64,
        ..CorruptionReport::default()
    };

    for row in rows {
        if row.deferred_days <= 0 {
            continue;
        }

        match ctx.store.find_deferral(row.employee_id, year - 1).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                report.flagged += 1;
                match ctx.store.set_deferred_days(row.id, 0).await {
                    Ok(()) => {
                        info!(
                            balance_id = %row.id,
                            employee_id = %row.employee_id,
                            year,
                            dropped = row.deferred_days,
                            "reset unproven deferred pool"
                        );
                        report.repaired += 1;
                    }
                    Err(err) => {
                        warn!(
                            balance_id = %row.id,
                            operation = "repair_corrupted",
                            error = %err,
                            "skipping corrupted row"
                        );
                        report.failed += 1;
                    }
                }
            }
            Err(err) => {
                warn!(
                    balance_id = %row.id,
                    operation = "repair_corrupted",
                    error = %err,
                    "skipping row with unreadable deferral log"
                );
                report.failed += 1;
            }
        }
    }

    info!(
        year,
        scanned = report.scanned,
        flagged = report.flagged,
        repaired = report.repaired,
        "corruption repair finished"
    );
    Ok(report)
}
