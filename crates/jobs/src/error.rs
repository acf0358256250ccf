//! Caller-facing error taxonomy.

use thiserror::Error;

use furlough_core::leave::LeaveError;
use furlough_shared::types::EmployeeId;
use furlough_store::StoreError;

/// Result type alias using `JobError`.
pub type JobResult<T> = Result<T, JobError>;

/// Errors surfaced by services and batch jobs.
///
/// Inside a batch loop, store failures are logged and counted rather than
/// raised; these variants reach callers only from single-item operations or
/// when a job cannot start at all.
#[derive(Debug, Error)]
pub enum JobError {
    /// A domain validation rule was violated.
    #[error(transparent)]
    Validation(#[from] LeaveError),

    /// A carry-over was already granted for this employee and year.
    #[error("Deferral already granted for employee {employee_id} from year {from_year}")]
    AlreadyDeferred {
        /// The employee whose grant was duplicated.
        employee_id: EmployeeId,
        /// The source year of the duplicated grant.
        from_year: i32,
    },

    /// A referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The row-store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Stored and computed values disagree in a way a job cannot repair.
    #[error("Consistency violation: {0}")]
    Consistency(String),
}

impl JobError {
    /// Returns a stable machine-readable code for host mapping.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(inner) => inner.error_code(),
            Self::AlreadyDeferred { .. } => "ALREADY_DEFERRED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Store(inner) => inner.error_code(),
            Self::Consistency(_) => "CONSISTENCY_VIOLATION",
        }
    }
}
