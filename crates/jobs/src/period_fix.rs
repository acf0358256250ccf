//! Repair of stored periods that disagree with their start date.
//!
//! Classification and reconciliation both key off `leave_period`, so this
//! repair is a prerequisite for their correctness. After a run, re-reconcile
//! the affected employees: their old and new years both drift.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use furlough_core::leave::quota;
use furlough_shared::types::EmployeeId;
use furlough_store::LeaveStore;

use crate::context::JobContext;
use crate::error::JobResult;

/// Pages skipped back-to-back before a run gives up.
const MAX_CONSECUTIVE_PAGE_FAILURES: u32 = 3;

/// Counters reported by a period repair run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PeriodFixReport {
    /// Pages processed in this run.
    pub pages: u32,
    /// Requests examined.
    pub scanned: u64,
    /// Requests whose stored period was rewritten.
    pub fixed: u64,
    /// Requests skipped after a store failure.
    pub failed: u64,
    /// Pages skipped because the page read itself failed.
    pub failed_pages: u32,
    /// Last page reached; resume from the next page after a failure or
    /// cancellation.
    pub last_page: u32,
    /// True when the run stopped early on the cancellation signal.
    pub cancelled: bool,
    /// Employees owning at least one rewritten request; re-run
    /// reconciliation for these.
    pub affected_employees: BTreeSet<EmployeeId>,
}

/// Rewrites `leave_period` to the start date's year wherever the two
/// disagree, page by page. The start date is authoritative, never the
/// reverse.
///
/// Row and page failures are logged, counted, and skipped like the
/// reconciliation job's; repeated consecutive page failures end the run
/// with a resumable report.
pub async fn fix_period_mismatches(
    ctx: &JobContext,
    resume_from_page: Option<u32>,
) -> JobResult<PeriodFixReport> {
    let mut report = PeriodFixReport::default();
    let mut page = ctx.page(resume_from_page.unwrap_or(1).max(1));
    let mut consecutive_page_failures: u32 = 0;

    loop {
        if ctx.cancel.is_cancelled() {
            report.cancelled = true;
            info!(last_page = report.last_page, "period repair cancelled");
            return Ok(report);
        }

        let rows = match ctx.store.leave_requests_page(page).await {
            Ok(rows) => {
                consecutive_page_failures = 0;
                rows
            }
            Err(err) => {
                warn!(
                    page = page.page,
                    operation = "fix_period_mismatches",
                    error = %err,
                    "skipping unreadable request page"
                );
                report.failed_pages += 1;
                report.last_page = page.page;
                consecutive_page_failures += 1;
                if consecutive_page_failures >= MAX_CONSECUTIVE_PAGE_FAILURES {
                    info!(last_page = report.last_page, "period repair halted on repeated page failures");
                    return Ok(report);
                }
                page = page.next();
                continue;
            }
        };
        if rows.is_empty() {
            break;
        }

        debug!(page = page.page, rows = rows.len(), "scanning request page");
        for request in &rows {
            report.scanned += 1;

            let Some(correct) = quota::period_mismatch(request) else {
                continue;
            };

            match ctx.store.set_request_period(request.id, correct).await {
                Ok(()) => {
                    debug!(
                        request_id = %request.id,
                        stored = ?request.leave_period,
                        correct,
                        "rewrote drifted period"
                    );
                    report.fixed += 1;
                    report.affected_employees.insert(request.employee_id);
                }
                Err(err) => {
                    warn!(
                        request_id = %request.id,
                        operation = "fix_period_mismatches",
                        error = %err,
                        "skipping request row"
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
        fixed = report.fixed,
        employees = report.affected_employees.len(),
        "period repair finished"
    );
    Ok(report)
}
