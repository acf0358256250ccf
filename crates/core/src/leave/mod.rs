//! Leave domain types, quota-year resolution, and balance calculation.

pub mod balance;
pub mod error;
pub mod quota;
pub mod types;
pub mod validation;

pub use balance::{BalanceBreakdown, calculate_balance, current_year_usage};
pub use error::LeaveError;
pub use types::{DeferralLog, LeaveBalance, LeaveRequest, LeaveType, RequestStatus};
