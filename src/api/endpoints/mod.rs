//! API endpoint handlers.
//!
//! Each module corresponds to a dashboard concern: connection checks,
//! record lists, and the prescription-safety check.

pub mod health;
pub mod records;
pub mod safety;
