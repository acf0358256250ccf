//! Row-store error types.

use thiserror::Error;

/// Result type alias using `StoreError`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the row-store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced row does not exist.
    #[error("Row not found in {table}: {detail}")]
    NotFound {
        /// Table the lookup ran against.
        table: &'static str,
        /// Key or filter description.
        detail: String,
    },

    /// A unique-key constraint rejected a write.
    #[error("Unique key conflict in {table}: {detail}")]
    Conflict {
        /// Table the write ran against.
        table: &'static str,
        /// Key description.
        detail: String,
    },

    /// The remote call exceeded its deadline.
    #[error("Row-store call timed out during {operation}")]
    Timeout {
        /// Operation description (table + verb).
        operation: String,
    },

    /// The backend reported a failure or was unreachable.
    #[error("Row-store backend error during {operation}: {message}")]
    Backend {
        /// Operation description (table + verb).
        operation: String,
        /// Backend-provided cause.
        message: String,
    },

    /// A row could not be decoded into its typed form.
    #[error("Failed to decode {table} row: {message}")]
    Decode {
        /// Table the row came from.
        table: &'static str,
        /// Decoder-provided cause.
        message: String,
    },
}

impl StoreError {
    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Backend { .. })
    }

    /// Returns a stable machine-readable code for host mapping.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Backend { .. } => "BACKEND_ERROR",
            Self::Decode { .. } => "DECODE_ERROR",
        }
    }
}
