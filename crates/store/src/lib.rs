//! Row-store boundary for Furlough.
//!
//! The remote row-store is an external collaborator offering filtered,
//! range-paginated reads and filtered writes over a fixed set of tables.
//! This crate exposes that contract as the typed [`LeaveStore`] trait, with
//! two implementations: [`memory::InMemoryStore`] for unit tests and
//! [`rest::RestStore`] for the production endpoint. Per-year holiday sets
//! come from interchangeable [`holidays::HolidayProvider`] sources.

pub mod error;
pub mod holidays;
pub mod memory;
pub mod rest;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use holidays::HolidayProvider;
pub use memory::InMemoryStore;
pub use rest::RestStore;
pub use store::LeaveStore;
