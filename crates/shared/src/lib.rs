//! Shared types and configuration for Furlough.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Pagination types for batch scans
//! - Configuration management

pub mod config;
pub mod types;

pub use config::AppConfig;
pub use types::{PageRequest, PageResponse};
