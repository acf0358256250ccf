//! Ledger-wide `used_days` recomputation.

use serde::Serialize;
use tracing::{debug, info, warn};

use furlough_core::leave::{self, LeaveBalance};
use furlough_store::LeaveStore;

use crate::context::JobContext;
use crate::error::{JobError, JobResult};

/// Pages skipped back-to-back before a run gives up; a persistently
/// unreachable store should hand control back to the caller instead of
/// walking every remaining page into the same error.
const MAX_CONSECUTIVE_PAGE_FAILURES: u32 = 3;

/// Counters reported by a reconciliation run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReconcileReport {
    /// Pages processed in this run.
    pub pages: u32,
    /// Ledger rows examined.
    pub scanned: u64,
    /// Rows whose stored `used_days` disagreed and were rewritten.
    pub updated: u64,
    /// Rows skipped after a store failure.
    pub failed: u64,
    /// Pages skipped because the page read itself failed.
    pub failed_pages: u32,
    /// Last page reached; resume from the next page after a failure or
    /// cancellation.
    pub last_page: u32,
    /// True when the run stopped early on the cancellation signal.
    pub cancelled: bool,
}

/// Recomputes `used_days` for every ledger row from the authoritative
/// requests, page by page.
///
/// For each row, the correct value is the sum of `days_requested` over
/// non-rejected requests of the row's employee and leave type whose period
/// and quota year both resolve to the row's year. Rows already holding that
/// value are untouched, so a second consecutive run performs zero updates.
///
/// A single row's failure is logged and skipped, never aborting the batch;
/// an unreadable page is likewise logged, counted, and skipped, up to a
/// small run of consecutive page failures after which the report is
/// returned for a later resume from `last_page`.
pub async fn recalculate_used_days(
    ctx: &JobContext,
    resume_from_page: Option<u32>,
) -> JobResult<ReconcileReport> {
    let mut report = ReconcileReport::default();
    let mut page = ctx.page(resume_from_page.unwrap_or(1).max(1));
    let mut consecutive_page_failures: u32 = 0;

    loop {
        if ctx.cancel.is_cancelled() {
            report.cancelled = true;
            info!(last_page = report.last_page, "reconciliation cancelled");
            return Ok(report);
        }

        let rows = match ctx.store.leave_balances_page(page).await {
            Ok(rows) => {
                consecutive_page_failures = 0;
                rows
            }
            Err(err) => {
                warn!(
                    page = page.page,
                    operation = "recalculate_used_days",
                    error = %err,
                    "skipping unreadable balance page"
                );
                report.failed_pages += 1;
                report.last_page = page.page;
                consecutive_page_failures += 1;
                if consecutive_page_failures >= MAX_CONSECUTIVE_PAGE_FAILURES {
                    info!(last_page = report.last_page, "reconciliation halted on repeated page failures");
                    return Ok(report);
                }
                page = page.next();
                continue;
            }
        };
        if rows.is_empty() {
            break;
        }

        debug!(page = page.page, rows = rows.len(), "reconciling balance page");
        for row in &rows {
            report.scanned += 1;
            match reconcile_row(ctx, row).await {
                Ok(true) => report.updated += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        balance_id = %row.id,
                        employee_id = %row.employee_id,
                        operation = "recalculate_used_days",
                        error = %err,
                        "skipping balance row"
                    );
                    report.failed += 1;
                }
            }
        }

        report.pages += 1;
        report.last_page = page.page;
        page = page.next();
    }

    info!(
        scanned = report.scanned,
        updated = report.updated,
        failed = report.failed,
        "reconciliation finished"
    );
    Ok(report)
}

async fn reconcile_row(ctx: &JobContext, row: &LeaveBalance) -> Result<bool, JobError> {
    let requests = ctx
        .store
        .requests_for_period(row.employee_id, row.leave_type_id, row.year)
        .await?;

    let correct = leave::current_year_usage(&requests, row.leave_type_id, row.year);
    if correct == row.used_days {
        return Ok(false);
    }

    ctx.store.set_used_days(row.id, correct).await?;
    debug!(
        balance_id = %row.id,
        stored = row.used_days,
        correct,
        "rewrote drifted used_days"
    );
    Ok(true)
}
