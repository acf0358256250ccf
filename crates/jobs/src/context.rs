//! The explicit job context.
//!
//! The legacy scripts leaned on an ambient database client and environment;
//! here every service and batch job receives its collaborators explicitly,
//! which is also what lets the test suite run against the in-memory store.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use furlough_shared::types::PageRequest;
use furlough_store::{HolidayProvider, LeaveStore};

/// Shared handles and tuning for services and batch jobs.
#[derive(Clone)]
pub struct JobContext {
    /// The row-store handle.
    pub store: Arc<dyn LeaveStore>,
    /// The holiday source.
    pub holidays: Arc<dyn HolidayProvider>,
    /// Fixed page size for batch scans.
    pub page_size: u32,
    /// Cooperative cancellation signal, checked between pages.
    pub cancel: CancellationToken,
}

impl JobContext {
    /// Creates a context with its own cancellation token.
    #[must_use]
    pub fn new(
        store: Arc<dyn LeaveStore>,
        holidays: Arc<dyn HolidayProvider>,
        page_size: u32,
    ) -> Self {
        Self {
            store,
            holidays,
            page_size: page_size.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the cancellation token, linking this context to an external
    /// shutdown signal.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Builds the page request for a given 1-indexed page number.
    #[must_use]
    pub fn page(&self, number: u32) -> PageRequest {
        PageRequest::new(number, self.page_size)
    }
}
