//! Ledger row creation for newly observed years.

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{Datelike, Utc};
use serde::Serialize;
use tracing::{info, warn};

use furlough_core::leave::LeaveBalance;
use furlough_shared::types::LeaveBalanceId;
use furlough_store::LeaveStore;

use crate::context::JobContext;
use crate::error::{JobError, JobResult};

/// Counters reported by a year-initialization run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct YearInitReport {
    /// (employee, leave type) pairs examined.
    pub examined: u64,
    /// Ledger rows created.
    pub created: u64,
    /// Pairs skipped after a store failure.
    pub failed: u64,
}

/// Creates missing ledger rows for a year, once per observed year per
/// process and again on a timer.
#[derive(Default)]
pub struct YearInitializer {
    seen: Mutex<BTreeSet<i32>>,
}

impl YearInitializer {
    /// Creates an initializer with no years memoized.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs [`run`](Self::run) the first time `year` is observed in this
    /// process; later calls return `None` without touching the store.
    ///
    /// # Errors
    ///
    /// Returns a store error when the row scan cannot start.
    pub async fn ensure(&self, ctx: &JobContext, year: i32) -> JobResult<Option<YearInitReport>> {
        {
            let mut seen = self.seen.lock().map_err(|_| {
                JobError::Consistency("year memo mutex poisoned".to_string())
            })?;
            if !seen.insert(year) {
                return Ok(None);
            }
        }
        Self::run(ctx, year).await.map(Some)
    }

    /// Creates a ledger row for every (employee, leave type) pair lacking
    /// one in `year`, copying the leave type's defaults. Idempotent: pairs
    /// that already have a row are left alone.
    ///
    /// # Errors
    ///
    /// Returns a store error when the employee or leave-type listing fails;
    /// per-pair failures are logged, counted, and skipped.
    pub async fn run(ctx: &JobContext, year: i32) -> JobResult<YearInitReport> {
        let leave_types = ctx.store.list_leave_types().await?;
        let employees = ctx.store.known_employee_ids().await?;

        let mut report = YearInitReport::default();
        for employee_id in &employees {
            for leave_type in &leave_types {
                report.examined += 1;

                let result = async {
                    if ctx
                        .store
                        .find_balance(*employee_id, leave_type.id, year)
                        .await?
                        .is_some()
                    {
                        return Ok::<bool, JobError>(false);
                    }
                    ctx.store
                        .insert_balance(LeaveBalance {
                            id: LeaveBalanceId::new(),
                            employee_id: *employee_id,
                            leave_type_id: leave_type.id,
                            year,
                            total_days: leave_type.default_days,
                            deferred_days: 0,
                            used_days: 0,
                            updated_at: Some(Utc::now()),
                        })
                        .await?;
                    Ok(true)
                }
                .await;

                match result {
                    Ok(true) => report.created += 1,
                    Ok(false) => {}
                    Err(err) => {
                        warn!(
                            employee_id = %employee_id,
                            leave_type = %leave_type.name,
                            year,
                            error = %err,
                            "skipping pair during year initialization"
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        info!(year, created = report.created, "year initialization finished");
        Ok(report)
    }

    /// Re-runs initialization for the current year on a fixed interval until
    /// the context is cancelled. The first tick fires after one interval.
    pub async fn run_on_interval(ctx: &JobContext, every: Duration) {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await; // immediate first tick is skipped

        loop {
            tokio::select! {
                () = ctx.cancel.cancelled() => return,
                _ = interval.tick() => {}
            }

            let year = Utc::now().date_naive().year();
            if let Err(err) = Self::run(ctx, year).await {
                warn!(error = %err, "scheduled year initialization failed");
            }
        }
    }
}
