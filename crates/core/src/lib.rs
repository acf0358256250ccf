//! Core leave accounting logic for Furlough.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, validation rules, and calculations live
//! here.
//!
//! # Modules
//!
//! - `calendar` - Working-day counting over a supplied holiday set
//! - `leave` - Leave domain types, quota-year resolution, balance calculation

pub mod calendar;
pub mod leave;
